use serde::{Deserialize, Serialize};

/// Placeholder shown wherever an image is missing or out of range.
pub const DEFAULT_IMAGE: &str = "default-image.jpg";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageRecord {
    pub id: u64,
    pub filename: Option<String>,
    pub thumbnail_filename: Option<String>,
    pub is_primary: bool,
}

impl ImageRecord {
    pub fn new(id: u64, filename: &str, is_primary: bool) -> Self {
        Self {
            id,
            filename: Some(filename.to_string()),
            thumbnail_filename: None,
            is_primary,
        }
    }
}

/// Builds absolute URLs for files served by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    base: String,
}

impl ResourcePath {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn url(&self, part: &str) -> String {
        format!("{}{}", self.base, part)
    }
}

fn image_field_url(
    images: &[ImageRecord],
    index: i64,
    resources: &ResourcePath,
    field: impl Fn(&ImageRecord) -> Option<&str>,
) -> String {
    usize::try_from(index)
        .ok()
        .and_then(|i| images.get(i))
        .and_then(field)
        .filter(|name| !name.is_empty())
        .map(|name| resources.url(name))
        .unwrap_or_else(|| DEFAULT_IMAGE.to_string())
}

/// Full-size image at `index`, or the placeholder.
pub fn main_image(images: &[ImageRecord], index: i64, resources: &ResourcePath) -> String {
    image_field_url(images, index, resources, |img| img.filename.as_deref())
}

/// Thumbnail at `index`, or the placeholder.
pub fn carousel_image(images: &[ImageRecord], index: i64, resources: &ResourcePath) -> String {
    image_field_url(images, index, resources, |img| {
        img.thumbnail_filename.as_deref()
    })
}

/// Ordered images with at most one primary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageList {
    images: Vec<ImageRecord>,
}

impl ImageList {
    /// Takes the backend's list as-is, except that extra primaries after the
    /// first are demoted.
    pub fn new(images: Vec<ImageRecord>) -> Self {
        let mut seen_primary = false;
        let images = images
            .into_iter()
            .map(|mut img| {
                if img.is_primary && seen_primary {
                    img.is_primary = false;
                }
                seen_primary |= img.is_primary;
                img
            })
            .collect();
        Self { images }
    }

    pub fn as_slice(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn primary(&self) -> Option<&ImageRecord> {
        self.images.iter().find(|img| img.is_primary)
    }

    pub fn primary_index(&self) -> Option<usize> {
        self.images.iter().position(|img| img.is_primary)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.images.iter().any(|img| img.id == id)
    }

    /// Remove `id`. When it was the primary, the first remaining image is
    /// promoted. Returns whether anything was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let Some(pos) = self.images.iter().position(|img| img.id == id) else {
            return false;
        };
        let removed = self.images.remove(pos);
        if removed.is_primary {
            if let Some(first) = self.images.first_mut() {
                first.is_primary = true;
            }
        }
        true
    }

    pub fn set_primary(&mut self, id: u64) -> bool {
        if !self.contains(id) {
            return false;
        }
        for img in &mut self.images {
            img.is_primary = img.id == id;
        }
        true
    }

    /// Append an uploaded image; it becomes primary when nothing else is.
    pub fn push(&mut self, mut image: ImageRecord) {
        image.is_primary = self.primary().is_none();
        self.images.push(image);
    }
}

/// What an image belongs to; decides the upload query and delete paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTarget {
    User { user_id: u64 },
    Business { business_id: u64 },
    Product { business_id: u64, product_id: String },
}

impl ImageTarget {
    /// Parse the location names used by the image modal.
    pub fn from_location(location: &str, id: u64, product_id: Option<&str>) -> Option<Self> {
        match (location, product_id) {
            ("User", _) => Some(Self::User { user_id: id }),
            ("Business", _) => Some(Self::Business { business_id: id }),
            ("Product", Some(pid)) if !pid.is_empty() => Some(Self::Product {
                business_id: id,
                product_id: pid.to_string(),
            }),
            _ => {
                tracing::warn!(location, "unknown image location");
                None
            }
        }
    }

    /// Query string for `POST /images`, including the leading `?`.
    pub fn query_params(&self) -> String {
        match self {
            Self::User { user_id } => format!("?uncheckedImageType=USER_IMAGE&userId={user_id}"),
            Self::Business { business_id } => {
                format!("?uncheckedImageType=BUSINESS_IMAGE&businessId={business_id}")
            }
            Self::Product {
                business_id,
                product_id,
            } => format!(
                "?uncheckedImageType=PRODUCT_IMAGE&businessId={business_id}&productId={product_id}"
            ),
        }
    }

    pub fn image_path(&self, image_id: u64) -> String {
        match self {
            Self::User { user_id } => format!("/users/{user_id}/images/{image_id}"),
            Self::Business { business_id } => {
                format!("/businesses/{business_id}/images/{image_id}")
            }
            Self::Product {
                business_id,
                product_id,
            } => format!("/businesses/{business_id}/products/{product_id}/images/{image_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res() -> ResourcePath {
        ResourcePath::new("some.test.url.com/")
    }

    fn named(files: &[&str]) -> Vec<ImageRecord> {
        files
            .iter()
            .enumerate()
            .map(|(i, f)| ImageRecord {
                id: i as u64 + 1,
                filename: Some(f.to_string()),
                thumbnail_filename: Some(format!("thumb-{f}")),
                is_primary: false,
            })
            .collect()
    }

    #[test]
    fn main_image_in_and_out_of_range() {
        let imgs = named(&["testing0.png", "testing1.png"]);
        assert_eq!(main_image(&imgs, 0, &res()), "some.test.url.com/testing0.png");
        assert_eq!(main_image(&imgs, 1, &res()), "some.test.url.com/testing1.png");
        assert_eq!(main_image(&imgs, -1, &res()), DEFAULT_IMAGE);
        assert_eq!(main_image(&imgs, 2, &res()), DEFAULT_IMAGE);
    }

    #[test]
    fn missing_filename_uses_placeholder() {
        let imgs = vec![ImageRecord::default(), ImageRecord::default()];
        assert_eq!(main_image(&imgs, 0, &res()), DEFAULT_IMAGE);
        assert_eq!(carousel_image(&imgs, 0, &res()), DEFAULT_IMAGE);
    }

    #[test]
    fn carousel_image_uses_thumbnail() {
        let imgs = named(&["a.png"]);
        assert_eq!(carousel_image(&imgs, 0, &res()), "some.test.url.com/thumb-a.png");
        assert_eq!(carousel_image(&imgs, -2, &res()), DEFAULT_IMAGE);
    }

    #[test]
    fn deleting_primary_promotes_first_remaining() {
        let mut list = ImageList::new(vec![
            ImageRecord::new(1, "/fakeImage1.jpg", true),
            ImageRecord::new(2, "/fakeImage2.png", false),
        ]);
        assert!(list.remove(1));
        assert_eq!(list.as_slice().len(), 1);
        assert_eq!(list.as_slice()[0].id, 2);
        assert!(list.as_slice()[0].is_primary);
    }

    #[test]
    fn deleting_other_keeps_primary() {
        let mut list = ImageList::new(vec![
            ImageRecord::new(1, "a", true),
            ImageRecord::new(2, "b", false),
        ]);
        assert!(list.remove(2));
        assert!(!list.remove(9));
        assert_eq!(list.primary().map(|i| i.id), Some(1));
    }

    #[test]
    fn constructor_keeps_only_first_primary() {
        let list = ImageList::new(vec![
            ImageRecord::new(1, "a", false),
            ImageRecord::new(2, "b", true),
            ImageRecord::new(3, "c", true),
        ]);
        assert_eq!(list.primary_index(), Some(1));
        assert_eq!(list.as_slice().iter().filter(|i| i.is_primary).count(), 1);
    }

    #[test]
    fn set_primary_and_push() {
        let mut list = ImageList::default();
        list.push(ImageRecord::new(3, "c", false));
        assert_eq!(list.primary().map(|i| i.id), Some(3));
        list.push(ImageRecord::new(4, "d", true));
        assert_eq!(list.primary().map(|i| i.id), Some(3));
        assert!(list.set_primary(4));
        assert!(!list.as_slice()[0].is_primary);
        assert!(list.as_slice()[1].is_primary);
        assert!(!list.set_primary(99));
    }

    #[test]
    fn image_query_params_per_location() {
        let user = ImageTarget::from_location("User", 1, None).unwrap();
        assert_eq!(user.query_params(), "?uncheckedImageType=USER_IMAGE&userId=1");
        let biz = ImageTarget::from_location("Business", 1, None).unwrap();
        assert_eq!(biz.query_params(), "?uncheckedImageType=BUSINESS_IMAGE&businessId=1");
        let product = ImageTarget::from_location("Product", 1, Some("VEGE")).unwrap();
        assert_eq!(
            product.query_params(),
            "?uncheckedImageType=PRODUCT_IMAGE&businessId=1&productId=VEGE"
        );
        assert!(ImageTarget::from_location("", 1, None).is_none());
    }
}
