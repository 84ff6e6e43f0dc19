//! Element copy capability supplied at channel construction.

/// Describes how one element's bytes are moved between slots.
///
/// Both slices are exactly `size` bytes long when called by the channel.
pub trait ElementAlgorithm: Send + Sync {
  fn copy(&self, size: usize, dst: &mut [u8], src: &[u8]);
}

/// Plain byte copy. Right for any element without interior pointers to fix up.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemCopy;

impl ElementAlgorithm for MemCopy {
  #[inline]
  fn copy(&self, size: usize, dst: &mut [u8], src: &[u8]) {
    dst[..size].copy_from_slice(&src[..size]);
  }
}

impl<F> ElementAlgorithm for F
where
  F: Fn(usize, &mut [u8], &[u8]) + Send + Sync,
{
  #[inline]
  fn copy(&self, size: usize, dst: &mut [u8], src: &[u8]) {
    self(size, dst, src)
  }
}
