use crate::error::Error;
use crate::PAGE_BLOCK_SIZE;

/// Absolute address of a read or write of `len` bytes at base-relative `offset`.
///
/// Rejects empty and oversized transfers before anything is dispatched.
pub(crate) fn transfer_address<E>(base: u32, offset: u32, len: usize) -> Result<u32, Error<E>> {
    if len == 0 {
        return Err(Error::EmptyTransfer);
    }
    if len > PAGE_BLOCK_SIZE {
        return Err(Error::InvalidAddress);
    }
    base.checked_add(offset).ok_or(Error::InvalidAddress)
}

/// Absolute address of page block `page_number`.
pub(crate) fn page_address<E>(base: u32, page_number: u32) -> Result<u32, Error<E>> {
    page_number
        .checked_mul(PAGE_BLOCK_SIZE as u32)
        .and_then(|offset| base.checked_add(offset))
        .ok_or(Error::InvalidAddress)
}

/// Page number of a base-relative, page-aligned byte offset.
pub(crate) fn page_of<E>(offset: u32) -> Result<u32, Error<E>> {
    if offset % PAGE_BLOCK_SIZE as u32 != 0 {
        return Err(Error::Unaligned);
    }
    Ok(offset / PAGE_BLOCK_SIZE as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x0010_0000;

    #[test]
    fn length_bounds() {
        assert_eq!(transfer_address::<()>(BASE, 0, 1), Ok(BASE));
        assert_eq!(transfer_address::<()>(BASE, 0, PAGE_BLOCK_SIZE), Ok(BASE));
        assert_eq!(
            transfer_address::<()>(BASE, 0, PAGE_BLOCK_SIZE + 1),
            Err(Error::InvalidAddress)
        );
        assert_eq!(transfer_address::<()>(BASE, 0, 0), Err(Error::EmptyTransfer));
    }

    #[test]
    fn offsets_are_base_relative() {
        assert_eq!(transfer_address::<()>(BASE, 0, 16), Ok(BASE));
        assert_eq!(transfer_address::<()>(BASE, 4096, 16), Ok(BASE + 4096));
        assert_eq!(
            transfer_address::<()>(u32::MAX, 1, 16),
            Err(Error::InvalidAddress)
        );
    }

    #[test]
    fn page_addresses() {
        assert_eq!(page_address::<()>(BASE, 0), Ok(BASE));
        assert_eq!(page_address::<()>(BASE, 1), Ok(BASE + 0x1000));
        assert_eq!(page_address::<()>(BASE, 4095), Ok(BASE + 4095 * 0x1000));
        assert_eq!(page_address::<()>(BASE, 0x0010_0000), Err(Error::InvalidAddress));
    }

    #[test]
    fn sector_offsets() {
        assert_eq!(page_of::<()>(0), Ok(0));
        assert_eq!(page_of::<()>(0x3000), Ok(3));
        assert_eq!(page_of::<()>(0x3001), Err(Error::Unaligned));
    }
}
