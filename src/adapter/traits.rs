use crate::error::InspectError;
use crate::model::{Record, RelationDescriptor};

/// The mapping paradigm a host application runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paradigm {
    Relational,
    Document,
}

impl Paradigm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Document => "document",
        }
    }
}

/// Uniform capability surface over the host application's mapping layer.
///
/// Exactly two implementations exist, relational and document, selected once
/// at startup by [`detect`](crate::adapter::detect). Everything downstream
/// depends only on this trait; no component re-checks the paradigm per call.
///
/// Reflection methods are synchronous (metadata lives in process memory);
/// record access is async because it is I/O-shaped in a real host.
#[async_trait::async_trait]
pub trait MappingAdapter: Send + Sync {
    fn paradigm(&self) -> Paradigm;

    /// Name of the primary-key field as the paradigm spells it.
    fn id_field(&self) -> &'static str;

    /// Eligible model class names: named, non-abstract, not embedded.
    /// Unordered; callers sort and apply configured exclusions.
    fn model_names(&self) -> Vec<String>;

    /// Declared field names for a model, in declaration order, with
    /// internal underscore-prefixed fields dropped.
    fn fields(&self, model: &str) -> Result<Vec<String>, InspectError>;

    /// Normalized relation descriptors for a model. The embedded inverse
    /// side is never included.
    fn relations(&self, model: &str) -> Result<Vec<RelationDescriptor>, InspectError>;

    /// Resolves a single record of an eligible model.
    async fn find(&self, model: &str, id: &str) -> Result<Record, InspectError>;

    /// One stable page of a model's records plus the unpaged total. Pages
    /// are non-overlapping across repeated calls on an unmodified dataset.
    async fn list_page(
        &self,
        model: &str,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<Record>, u64), InspectError>;

    /// One stable page of records related to `record` through `relation`.
    async fn fetch_related(
        &self,
        record: &Record,
        relation: &RelationDescriptor,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<Record>, InspectError>;

    async fn count_related(
        &self,
        record: &Record,
        relation: &RelationDescriptor,
    ) -> Result<u64, InspectError>;
}

/// Offset/limit window over an already-ordered slice. Shared by both
/// adapters; `page` is 1-based.
pub(crate) fn page_slice<T: Clone>(items: &[T], page: usize, per_page: usize) -> Vec<T> {
    let offset = page.saturating_sub(1).saturating_mul(per_page);
    items.iter().skip(offset).take(per_page).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_slice_windows_are_non_overlapping() {
        let items: Vec<i32> = (1..=5).collect();
        assert_eq!(page_slice(&items, 1, 2), vec![1, 2]);
        assert_eq!(page_slice(&items, 2, 2), vec![3, 4]);
        assert_eq!(page_slice(&items, 3, 2), vec![5]);
        assert!(page_slice(&items, 4, 2).is_empty());
    }
}
