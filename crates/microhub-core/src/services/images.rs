use std::future::Future;

use super::{require_prompt, ServiceResult};

const PLACEHOLDER_BASE_URL: &str = "https://picsum.photos/seed";
const PLACEHOLDER_SIZE: u32 = 800;

pub trait ImageGenerator: Send + Sync {
    /// Returns a URL for an image matching `prompt`.
    fn generate_image(&self, prompt: &str) -> impl Future<Output = ServiceResult<String>> + Send;
}

/// Deterministic placeholder image seeded by the prompt text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderImageGenerator;

impl PlaceholderImageGenerator {
    pub fn image_url(prompt: &str) -> ServiceResult<String> {
        let prompt = require_prompt(prompt)?;
        Ok(format!(
            "{PLACEHOLDER_BASE_URL}/{}/{PLACEHOLDER_SIZE}/{PLACEHOLDER_SIZE}",
            urlencoding::encode(prompt)
        ))
    }
}

impl ImageGenerator for PlaceholderImageGenerator {
    async fn generate_image(&self, prompt: &str) -> ServiceResult<String> {
        Self::image_url(prompt)
    }
}
