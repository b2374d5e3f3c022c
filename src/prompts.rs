use crate::models::ImagePayload;

pub const PREDICT_SYSTEM: &str = include_str!("../data/prompts/predict_system.txt");

/// System instruction plus the drawing to analyse, as sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: &'static str,
    pub image: ImagePayload,
}

/// Build the prediction prompt for one drawing.
pub fn compose(image: &ImagePayload) -> Prompt {
    Prompt {
        system: PREDICT_SYSTEM,
        image: image.clone(),
    }
}
