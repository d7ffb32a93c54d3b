use rand::Rng;

/// Source of uniformly distributed integers for spawning heads and food
pub trait RandomSource {
    /// Uniform integer in `[min, max]`, both bounds inclusive
    fn uniform_int(&mut self, min: i32, max: i32) -> i32;
}

impl<R: Rng> RandomSource for R {
    fn uniform_int(&mut self, min: i32, max: i32) -> i32 {
        self.gen_range(min..=max)
    }
}
