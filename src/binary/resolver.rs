//! Decoding of record payloads and their redirect pointers.
//!
//! A record starts with its 4-byte end address followed by a flag byte:
//!
//! ```text
//! 0x01  ptr:u24           -> block at ptr holds country and area
//!                            (the block may itself start with 0x02 ptr)
//! 0x02  ptr:u24  area...  -> country at ptr, area follows the pointer
//! other                   -> inline "country\0" then area
//! ```
//!
//! An area is either inline or `0x01|0x02 ptr:u24`. Every pointer is an
//! absolute offset from the start of the buffer, never from the record.

use super::format::{RedirectMode, OFFSET_LEN};
use super::view::ByteView;
use crate::location::Location;
use crate::LookupError;

/// Resolves the location strings of a record.
#[derive(Debug, Clone, Copy)]
pub struct RedirectResolver<'a> {
    view: ByteView<'a>,
}

impl<'a> RedirectResolver<'a> {
    /// Create a resolver over `view`.
    pub fn new(view: ByteView<'a>) -> Self {
        Self { view }
    }

    /// Decode the country and area of the record at `record_offset`.
    pub fn resolve(&self, record_offset: usize) -> Result<Location<'a>, LookupError> {
        // Skip the end address
        self.view.read_u32le(record_offset)?;
        let flag_pos = record_offset + 4;
        let pos = flag_pos + 1;

        match RedirectMode::from_flag(self.view.read_u8(flag_pos)?) {
            RedirectMode::RedirectCountryAndArea => {
                let country_offset = self.view.read_u24le(pos)? as usize;
                self.resolve_block(country_offset)
            }
            RedirectMode::RedirectCountryOnly => {
                let country = self.read_via_pointer(pos)?;
                let area = self.resolve_area(flag_pos + 1 + OFFSET_LEN)?;
                Ok(Location::new(country, area))
            }
            RedirectMode::Inline => self.resolve_inline(flag_pos),
        }
    }

    /// Decode the block a `0x01` redirect points at.
    fn resolve_block(&self, block: usize) -> Result<Location<'a>, LookupError> {
        match RedirectMode::from_flag(self.view.read_u8(block)?) {
            RedirectMode::RedirectCountryOnly => {
                let country = self.read_via_pointer(block + 1)?;
                let area = self.resolve_area(block + 1 + OFFSET_LEN)?;
                Ok(Location::new(country, area))
            }
            // A nested 0x01 is not part of the format; its byte is read as text
            RedirectMode::RedirectCountryAndArea | RedirectMode::Inline => {
                self.resolve_inline(block)
            }
        }
    }

    /// Inline country at `pos` followed by its area.
    fn resolve_inline(&self, pos: usize) -> Result<Location<'a>, LookupError> {
        let country = self.view.read_cstring(pos)?;
        if country.is_empty() {
            return Err(LookupError::NotFound);
        }
        let area = self.resolve_area(pos + country.len() + 1)?;
        Ok(Location::new(country, area))
    }

    /// Decode an area at `pos`. An empty area is valid.
    pub fn resolve_area(&self, pos: usize) -> Result<&'a [u8], LookupError> {
        match RedirectMode::from_flag(self.view.read_u8(pos)?) {
            RedirectMode::RedirectCountryAndArea | RedirectMode::RedirectCountryOnly => {
                self.read_via_pointer(pos + 1)
            }
            RedirectMode::Inline => self.view.read_cstring(pos),
        }
    }

    /// Read the pointer at `pos` and the string it points to.
    fn read_via_pointer(&self, pos: usize) -> Result<&'a [u8], LookupError> {
        let target = self.view.read_u24le(pos)? as usize;
        self.view.read_cstring(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u24(value: usize) -> [u8; 3] {
        let b = (value as u32).to_le_bytes();
        [b[0], b[1], b[2]]
    }

    fn resolve(data: &[u8], offset: usize) -> Result<(Vec<u8>, Vec<u8>), LookupError> {
        RedirectResolver::new(ByteView::new(data))
            .resolve(offset)
            .map(|loc| (loc.country.to_vec(), loc.area.to_vec()))
    }

    #[test]
    fn test_inline_record() {
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&[0xFF; 4]);
        data.extend_from_slice(b"China\0Beijing\0");
        assert_eq!(
            resolve(&data, 8).unwrap(),
            (b"China".to_vec(), b"Beijing".to_vec())
        );
    }

    #[test]
    fn test_inline_empty_area() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(b"X\0\0");
        assert_eq!(resolve(&data, 0).unwrap(), (b"X".to_vec(), Vec::new()));
    }

    #[test]
    fn test_inline_empty_country_not_found() {
        let mut data = vec![0u8; 4];
        data.extend_from_slice(b"\0Area\0");
        assert_eq!(resolve(&data, 0), Err(LookupError::NotFound));
    }

    #[test]
    fn test_country_redirect() {
        // 0..4 "Y\0" shared country, record at 4
        let mut data = b"YY\0\0".to_vec();
        data.extend_from_slice(&[0xFF; 4]);
        data.push(0x02);
        data.extend_from_slice(&u24(1));
        data.extend_from_slice(b"B\0");
        assert_eq!(resolve(&data, 4).unwrap(), (b"Y".to_vec(), b"B".to_vec()));
    }

    #[test]
    fn test_country_redirect_with_area_redirect() {
        let mut data = b"Country\0Area\0".to_vec();
        let record = data.len();
        data.extend_from_slice(&[0xFF; 4]);
        data.push(0x02);
        data.extend_from_slice(&u24(0));
        data.push(0x01);
        data.extend_from_slice(&u24(8));
        assert_eq!(
            resolve(&data, record).unwrap(),
            (b"Country".to_vec(), b"Area".to_vec())
        );
    }

    #[test]
    fn test_double_redirect_to_inline_block() {
        let mut data = vec![0u8; 4];
        let block = data.len();
        data.extend_from_slice(b"C\0A\0");
        let record = data.len();
        data.extend_from_slice(&[0xFF; 4]);
        data.push(0x01);
        data.extend_from_slice(&u24(block));
        assert_eq!(resolve(&data, record).unwrap(), (b"C".to_vec(), b"A".to_vec()));
    }

    #[test]
    fn test_double_redirect_to_country_redirect() {
        // Shared country string, then a block that redirects to it with an
        // inline area, then a record that redirects to the block.
        let mut data = b"Shared\0".to_vec();
        let block = data.len();
        data.push(0x02);
        data.extend_from_slice(&u24(0));
        data.extend_from_slice(b"Local\0");
        let record = data.len();
        data.extend_from_slice(&[0xFF; 4]);
        data.push(0x01);
        data.extend_from_slice(&u24(block));
        assert_eq!(
            resolve(&data, record).unwrap(),
            (b"Shared".to_vec(), b"Local".to_vec())
        );
    }

    #[test]
    fn test_double_redirect_to_empty_block() {
        let mut data = vec![0u8; 4];
        let record = data.len();
        data.extend_from_slice(&[0xFF; 4]);
        data.push(0x01);
        data.extend_from_slice(&u24(0));
        assert_eq!(resolve(&data, record), Err(LookupError::NotFound));
    }

    #[test]
    fn test_pointers_are_absolute() {
        // The pointer value equals a valid offset relative to the record,
        // but it must be read from the buffer start.
        let mut data = b"Abs\0".to_vec();
        data.extend_from_slice(&[0u8; 4]);
        let record = data.len();
        data.extend_from_slice(&[0xFF; 4]);
        data.push(0x02);
        data.extend_from_slice(&u24(0));
        data.extend_from_slice(b"\0");
        assert_eq!(resolve(&data, record).unwrap().0, b"Abs".to_vec());
    }

    #[test]
    fn test_pointer_past_end() {
        let mut data = vec![0u8; 4];
        data.push(0x02);
        data.extend_from_slice(&u24(0x00FF_FFFF));
        data.push(0);
        assert!(matches!(
            resolve(&data, 0),
            Err(LookupError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_truncated_record() {
        let data = vec![0u8; 6];
        let result = RedirectResolver::new(ByteView::new(&data)).resolve(4);
        assert!(matches!(result, Err(LookupError::OutOfBounds { .. })));
    }

    #[test]
    fn test_area_after_unterminated_country() {
        // Country runs to the buffer end, so the area position is past it
        let mut data = vec![0u8; 4];
        data.extend_from_slice(b"Tail");
        assert!(matches!(
            resolve(&data, 0),
            Err(LookupError::OutOfBounds { .. })
        ));
    }
}
