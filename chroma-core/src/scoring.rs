use chroma_types::Rgb;

pub struct ScoringEngine;

impl ScoringEngine {
    pub const MAX_POINTS: u32 = 100;

    /// Euclidean distance between two colors in the RGB cube
    pub fn distance(a: Rgb, b: Rgb) -> f64 {
        let dr = f64::from(a.r) - f64::from(b.r);
        let dg = f64::from(a.g) - f64::from(b.g);
        let db = f64::from(a.b) - f64::from(b.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Distance between opposite corners of the RGB cube
    pub fn max_distance() -> f64 {
        (3.0 * 255.0_f64 * 255.0).sqrt()
    }

    /// Points for a single guess: `MAX_POINTS` for an exact match, falling
    /// linearly to 0 at the maximum possible distance.
    pub fn calculate_score(guess: Rgb, target: Rgb) -> u32 {
        let max = f64::from(Self::MAX_POINTS);
        let ratio = Self::distance(guess, target) / Self::max_distance();
        let points = (max - max * ratio).max(0.0);
        points.round() as u32
    }
}
