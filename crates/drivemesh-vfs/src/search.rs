//! Search: a name/path sweep over the VFS tree, with an optional glob
//! pattern and an optional MIME type facet.

use std::sync::Arc;

use glob::Pattern;

use drivemesh_core::domain::newtypes::{BucketName, ObjectKey};
use drivemesh_core::domain::{CoreError, DirectoryId, VirtualFile};
use drivemesh_core::ports::MetadataStore;

use crate::vfs::internal;

/// Coarse content-type facets a search can narrow by, mapped onto MIME
/// prefixes the way a file manager's filter chips usually do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFacet {
    Image,
    Video,
    Audio,
    Document,
}

impl TypeFacet {
    fn matches(self, mime_type: &str) -> bool {
        match self {
            TypeFacet::Image => mime_type.starts_with("image/"),
            TypeFacet::Video => mime_type.starts_with("video/"),
            TypeFacet::Audio => mime_type.starts_with("audio/"),
            TypeFacet::Document => {
                mime_type.starts_with("text/")
                    || matches!(
                        mime_type,
                        "application/pdf"
                            | "application/msword"
                            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                            | "application/vnd.ms-excel"
                            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                    )
            }
        }
    }
}

enum NameMatch {
    Substring(String),
    Glob(Pattern),
}

impl NameMatch {
    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatch::Substring(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
            NameMatch::Glob(pattern) => pattern.matches(name),
        }
    }
}

pub struct SearchService {
    store: Arc<dyn MetadataStore>,
}

impl SearchService {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Searches the whole tree. `query` is a glob pattern (e.g. `*.pdf`)
    /// when `is_glob` is set, otherwise a case-insensitive substring match
    /// against each file's name.
    pub async fn search(
        &self,
        query: &str,
        is_glob: bool,
        type_facet: Option<TypeFacet>,
    ) -> Result<Vec<VirtualFile>, CoreError> {
        let matcher = if is_glob {
            NameMatch::Glob(Pattern::new(query).map_err(|e| CoreError::InvalidRequest(e.to_string()))?)
        } else {
            NameMatch::Substring(query.to_string())
        };

        let mut matches = Vec::new();
        self.walk(&DirectoryId::root(), &matcher, type_facet, &mut matches).await?;
        Ok(matches)
    }

    async fn walk(
        &self,
        dir_id: &DirectoryId,
        matcher: &NameMatch,
        type_facet: Option<TypeFacet>,
        out: &mut Vec<VirtualFile>,
    ) -> Result<(), CoreError> {
        for file in self.store.list_child_files(dir_id).await.map_err(internal)? {
            if !matcher.matches(file.name()) {
                continue;
            }
            if let Some(facet) = type_facet {
                let bucket = BucketName::new(file.object_bucket().to_string()).map_err(CoreError::Domain)?;
                let key = ObjectKey::new(file.object_key().to_string()).map_err(CoreError::Domain)?;
                let object = self.store.get_object(&bucket, &key).await.map_err(internal)?;
                let Some(object) = object else { continue };
                if !facet.matches(object.mime_type()) {
                    continue;
                }
            }
            out.push(file);
        }

        for dir in self.store.list_child_directories(dir_id).await.map_err(internal)? {
            let child_id = dir.id().clone();
            Box::pin(self.walk(&child_id, matcher, type_facet, out)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivemesh_core::domain::newtypes::VirtualPath;
    use drivemesh_core::domain::object::Object;
    use drivemesh_core::domain::{Bucket, Placement, VirtualFile};

    use crate::test_support::FakeStore;

    async fn store_with_files() -> Arc<dyn MetadataStore> {
        let store: Arc<dyn MetadataStore> = Arc::new(
            FakeStore::new().with_bucket(Bucket::new(BucketName::new("bucket".into()).unwrap())),
        );

        for (name, mime) in [("report.pdf", "application/pdf"), ("photo.jpg", "image/jpeg"), ("notes.txt", "text/plain")] {
            let key = ObjectKey::new(format!("vfs/{name}")).unwrap();
            let object = Object::new(
                BucketName::new("bucket".into()).unwrap(),
                key.clone(),
                10,
                "etag".into(),
                mime,
                Placement::Local { relative_path: name.to_string() },
            );
            store.put_object(&object).await.unwrap();

            let path = VirtualPath::new(format!("/{name}")).unwrap();
            let file = VirtualFile::new(DirectoryId::root(), name, path, "bucket", key.to_string(), 10);
            store.create_file(&file).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn substring_search_is_case_insensitive() {
        let store = store_with_files().await;
        let results = SearchService::new(store).search("REPORT", false, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "report.pdf");
    }

    #[tokio::test]
    async fn glob_search_matches_by_extension() {
        let store = store_with_files().await;
        let results = SearchService::new(store).search("*.txt", true, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "notes.txt");
    }

    #[tokio::test]
    async fn type_facet_filters_by_mime_prefix() {
        let store = store_with_files().await;
        let results = SearchService::new(store).search("*", true, Some(TypeFacet::Image)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "photo.jpg");
    }
}
