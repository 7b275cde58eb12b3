use serde::{Deserialize, Serialize};

/// Capture region in display points, in the display's own coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let all_finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("crop rect must be finite".into());
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(format!(
                "crop rect must have positive size, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}
