use rand::{RngCore, SeedableRng};

use crate::hybrid::HybridRng;
use crate::local::LocalRng;
use crate::remote::RemoteSource;

impl RngCore for &LocalRng {
    fn next_u32(&mut self) -> u32 {
        (self.u64() >> 32) as _
    }

    fn next_u64(&mut self) -> u64 {
        self.u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for LocalRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        LocalRng::new(u64::from_ne_bytes(seed))
    }
}

impl<S: RemoteSource> RngCore for HybridRng<S> {
    fn next_u32(&mut self) -> u32 {
        HybridRng::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        (HybridRng::next_u32(self) as u64) << 32 | HybridRng::next_u32(self) as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
