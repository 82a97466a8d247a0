use std::sync::Arc;

use brief_scraper::RequestPipeline;

use crate::views::{TemplateError, Views};

pub struct AppState {
    pub pipeline: Arc<RequestPipeline>,
    pub views: Views,
}

impl AppState {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Result<Self, TemplateError> {
        Ok(Self {
            pipeline,
            views: Views::new()?,
        })
    }
}
