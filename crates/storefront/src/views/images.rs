//! Image management modal for users, businesses and products.

use crate::api::{ApiFailure, MarketplaceApi};
use crate::images::{ImageList, ImageRecord, ImageTarget};
use crate::outcome::{Operation, Route, resolve};

#[derive(Debug, Clone)]
pub struct ImageManager {
    target: ImageTarget,
    images: ImageList,
    selected: Option<u64>,
    error: Option<String>,
}

impl ImageManager {
    pub fn new(target: ImageTarget, images: Vec<ImageRecord>) -> Self {
        Self {
            target,
            images: ImageList::new(images),
            selected: None,
            error: None,
        }
    }

    pub fn target(&self) -> &ImageTarget {
        &self.target
    }

    pub fn images(&self) -> &ImageList {
        &self.images
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    pub fn primary_image(&self) -> Option<u64> {
        self.images.primary().map(|img| img.id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clicking the selected image again deselects it.
    pub fn set_selected(&mut self, id: u64) {
        self.selected = if self.selected == Some(id) { None } else { Some(id) };
    }

    /// Delete and make-primary buttons only show with a selection.
    pub fn shows_actions(&self) -> bool {
        self.selected.is_some()
    }

    fn fail(&mut self, op: Operation, failure: &ApiFailure) -> Option<Route> {
        let outcome = resolve(op, failure);
        self.error = outcome.message;
        outcome.redirect
    }

    pub fn delete_selected(&mut self, api: &dyn MarketplaceApi) -> Option<Route> {
        let id = self.selected?;
        self.error = None;
        match api.delete_image(&self.target, id) {
            Ok(_) => {
                self.images.remove(id);
                self.selected = None;
                tracing::info!(image_id = id, "image deleted");
                None
            }
            Err(failure) => self.fail(Operation::ChangeImage, &failure),
        }
    }

    pub fn make_selected_primary(&mut self, api: &dyn MarketplaceApi) -> Option<Route> {
        let id = self.selected?;
        self.error = None;
        match api.set_primary_image(&self.target, id) {
            Ok(_) => {
                self.images.set_primary(id);
                None
            }
            Err(failure) => self.fail(Operation::ChangeImage, &failure),
        }
    }

    pub fn upload(&mut self, api: &dyn MarketplaceApi, file_name: &str, bytes: Vec<u8>) -> Option<Route> {
        self.error = None;
        match api.upload_image(&self.target, file_name, bytes) {
            Ok(reply) => {
                tracing::info!(image_id = reply.data.id, file_name, "image uploaded");
                self.images.push(reply.data);
                None
            }
            Err(failure) => self.fail(Operation::UploadImage, &failure),
        }
    }
}
