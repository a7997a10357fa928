//! Storage service
//!
//! Persists uploads flat under a single root directory and forwards each
//! stored file to the vector store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use crate::config::StorageProperties;
use crate::error::StorageError;
use crate::ingest::{JsonReader, VectorStore};
use crate::storage::filesystem::{create_directory, file_exists, remove_directory, write_replacing};
use crate::storage::results::{StoreResult, StoredFiles, StoredResource, UploadedFile};
use crate::storage::validation::{absolutize, resolve_flat_file};

/// Operations offered over the storage root.
pub trait StorageService: Send + Sync {
    /// Create the root directory (and parents) if absent.
    fn init(&self) -> Result<(), StorageError>;

    /// Persist `file` directly under the root, then ingest it.
    fn store(&self, file: &UploadedFile) -> Result<StoreResult, StorageError>;

    /// Entries directly under the root, relative to it.
    fn load_all(&self) -> Result<StoredFiles, StorageError>;

    /// Path of `filename` under the root.
    fn load(&self, filename: &str) -> Result<PathBuf, StorageError>;

    /// Readable handle to an existing stored file.
    fn load_as_resource(&self, filename: &str) -> Result<StoredResource, StorageError>;

    /// Remove the root and everything under it. Returns whether anything was removed.
    fn delete_all(&self) -> Result<bool, StorageError>;
}

#[derive(Debug)]
pub struct FileSystemStorageService {
    root: PathBuf,
    reader: JsonReader,
    vector_store: Arc<dyn VectorStore>,
}

impl FileSystemStorageService {
    pub fn new(
        properties: &StorageProperties,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self, StorageError> {
        if properties.location.trim().is_empty() {
            return Err(StorageError::Configuration(
                "Upload location cannot be empty".into(),
            ));
        }

        let root = absolutize(&properties.location_path())?;

        Ok(Self {
            root,
            reader: JsonReader::default(),
            vector_store,
        })
    }

    /// Absolute, normalised storage root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StorageService for FileSystemStorageService {
    fn init(&self) -> Result<(), StorageError> {
        create_directory(&self.root)
            .map_err(|e| StorageError::io("Could not initialize the storage folder", e))?;
        info!("Storage root ready: {}", self.root.display());
        Ok(())
    }

    fn store(&self, file: &UploadedFile) -> Result<StoreResult, StorageError> {
        if file.is_empty() {
            return Err(StorageError::EmptyFile(file.filename.clone()));
        }

        let destination = resolve_flat_file(&self.root, &file.filename)?;

        write_replacing(&destination, &file.content).map_err(|e| {
            StorageError::io(format!("Failed to store file {}", file.filename), e)
        })?;
        info!(
            "Stored {} ({} bytes) at {}",
            file.filename,
            file.len(),
            destination.display()
        );

        // Ingestion failures propagate untouched and leave the file on disk.
        info!("Creating embeddings for {}", file.filename);
        let documents = self.reader.read(&destination)?;
        info!("Read {} records from {}", documents.len(), file.filename);
        let added = self.vector_store.add(&documents)?;
        info!("Indexed {} documents from {}", added, file.filename);

        Ok(StoreResult {
            filename: file.filename.clone(),
            path: destination,
            documents: added,
        })
    }

    fn load_all(&self) -> Result<StoredFiles, StorageError> {
        match fs::read_dir(&self.root) {
            Ok(entries) => Ok(StoredFiles::new(entries)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Storage root {} does not exist", self.root.display());
                Ok(StoredFiles::empty())
            }
            Err(e) => Err(StorageError::io("Failed to read stored files", e)),
        }
    }

    fn load(&self, filename: &str) -> Result<PathBuf, StorageError> {
        resolve_flat_file(&self.root, filename)
    }

    fn load_as_resource(&self, filename: &str) -> Result<StoredResource, StorageError> {
        let path = self.load(filename)?;
        if !file_exists(&path) {
            return Err(StorageError::NotFound(filename.to_string()));
        }

        let metadata =
            fs::metadata(&path).map_err(|_| StorageError::NotFound(filename.to_string()))?;

        Ok(StoredResource {
            filename: filename.to_string(),
            path,
            size: metadata.len(),
        })
    }

    fn delete_all(&self) -> Result<bool, StorageError> {
        let removed = remove_directory(&self.root)
            .map_err(|e| StorageError::io("Could not delete the storage folder", e))?;
        if removed {
            info!("Deleted storage root {}", self.root.display());
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind as Kind, IngestError};
    use crate::ingest::{Document, InMemoryVectorStore};
    use std::io::Read;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct FailingVectorStore;

    impl VectorStore for FailingVectorStore {
        fn add(&self, _documents: &[Document]) -> Result<usize, IngestError> {
            Err(IngestError::Backend("index unavailable".into()))
        }
    }

    const RECORDS: &[u8] = br#"[{"area": "Ciencias", "contenido": "Celulas"}, {"tema": "Algebra"}]"#;

    fn service_in(temp: &TempDir, store: Arc<dyn VectorStore>) -> FileSystemStorageService {
        let properties = StorageProperties {
            location: temp.path().join("uploads").to_string_lossy().to_string(),
            reset_on_boot: true,
        };
        let service = FileSystemStorageService::new(&properties, store).unwrap();
        service.init().unwrap();
        service
    }

    fn names(service: &FileSystemStorageService) -> Vec<String> {
        let mut names: Vec<String> = service
            .load_all()
            .unwrap()
            .map(|p| p.unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_blank_location_rejected() {
        let properties = StorageProperties {
            location: "  ".into(),
            reset_on_boot: true,
        };
        let err =
            FileSystemStorageService::new(&properties, Arc::new(InMemoryVectorStore::new()))
                .unwrap_err();
        assert_eq!(err.kind(), Kind::Configuration);
    }

    #[test]
    fn test_store_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let vectors = Arc::new(InMemoryVectorStore::new());
        let service = service_in(&temp, vectors.clone());

        let result = service
            .store(&UploadedFile::new("temas.json", RECORDS))
            .unwrap();
        assert_eq!(result.documents, 2);
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.documents()[0].content, "area: Ciencias\ncontenido: Celulas\n");

        let path = service.load("temas.json").unwrap();
        assert_eq!(path, result.path);
        assert_eq!(fs::read(path).unwrap(), RECORDS);

        let resource = service.load_as_resource("temas.json").unwrap();
        assert_eq!(resource.size, RECORDS.len() as u64);
        assert_eq!(resource.contents().unwrap(), RECORDS);

        let mut opened = String::new();
        resource.open().unwrap().read_to_string(&mut opened).unwrap();
        assert!(opened.contains("Celulas"));
    }

    #[test]
    fn test_empty_file_rejected() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));

        let err = service.store(&UploadedFile::new("empty.json", Vec::<u8>::new())).unwrap_err();
        assert!(matches!(err, StorageError::EmptyFile(_)));
        assert!(names(&service).is_empty());
    }

    #[test]
    fn test_traversal_rejected_and_nothing_written() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));
        let outside = temp.path().join("outside.json");

        let err = service
            .store(&UploadedFile::new("../outside.json", RECORDS))
            .unwrap_err();
        assert!(matches!(err, StorageError::PathEscapesRoot(_)));

        let absolute = outside.to_string_lossy().to_string();
        let err = service.store(&UploadedFile::new(absolute, RECORDS)).unwrap_err();
        assert!(matches!(err, StorageError::PathEscapesRoot(_)));

        assert!(!outside.exists());
        assert!(names(&service).is_empty());
    }

    #[test]
    fn test_subdirectory_target_rejected() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));
        fs::create_dir(service.root().join("nested")).unwrap();

        let err = service
            .store(&UploadedFile::new("nested/a.json", RECORDS))
            .unwrap_err();
        assert!(matches!(err, StorageError::PathEscapesRoot(_)));
        assert!(!service.root().join("nested/a.json").exists());
    }

    #[test]
    fn test_reupload_overwrites() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));

        service
            .store(&UploadedFile::new("f.json", br#"{"tema": "v1"}"#.to_vec()))
            .unwrap();
        service
            .store(&UploadedFile::new("f.json", br#"{"tema": "v2"}"#.to_vec()))
            .unwrap();

        let contents = service.load_as_resource("f.json").unwrap().contents().unwrap();
        assert_eq!(contents, br#"{"tema": "v2"}"#);
        assert_eq!(names(&service), vec!["f.json"]);
    }

    #[test]
    fn test_ingestion_failure_keeps_file() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(FailingVectorStore));

        let err = service.store(&UploadedFile::new("a.json", RECORDS)).unwrap_err();
        assert_eq!(err.kind(), Kind::Ingestion);
        assert!(service.load_as_resource("a.json").is_ok());
    }

    #[test]
    fn test_malformed_json_is_ingestion_error() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));

        let err = service
            .store(&UploadedFile::new("bad.json", b"{ not json".to_vec()))
            .unwrap_err();
        assert!(matches!(err, StorageError::Ingestion(IngestError::Parse { .. })));
        assert_eq!(names(&service), vec!["bad.json"]);
    }

    #[test]
    fn test_load_as_resource_missing() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));

        let err = service.load_as_resource("never.json").unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[test]
    fn test_load_guards_traversal() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));

        assert!(matches!(
            service.load("../../etc/passwd"),
            Err(StorageError::PathEscapesRoot(_))
        ));
        assert!(matches!(
            service.load_as_resource("../x.json"),
            Err(StorageError::PathEscapesRoot(_))
        ));
    }

    #[test]
    fn test_delete_all_then_listing_is_empty() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));
        service.store(&UploadedFile::new("a.json", RECORDS)).unwrap();

        assert!(service.delete_all().unwrap());
        assert!(names(&service).is_empty());
        assert!(!service.delete_all().unwrap());

        service.init().unwrap();
        assert!(names(&service).is_empty());
    }

    #[test]
    fn test_init_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));
        service.init().unwrap();
        service.init().unwrap();
        assert!(service.root().is_dir());
    }

    #[test]
    fn test_init_fails_on_file_collision() {
        let temp = TempDir::new().unwrap();
        let location = temp.path().join("occupied");
        fs::write(&location, b"x").unwrap();

        let properties = StorageProperties {
            location: location.to_string_lossy().to_string(),
            reset_on_boot: false,
        };
        let service =
            FileSystemStorageService::new(&properties, Arc::new(InMemoryVectorStore::new()))
                .unwrap();
        let err = service.init().unwrap_err();
        assert_eq!(err.kind(), Kind::Storage);
    }

    #[test]
    fn test_listing_is_one_level() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));
        service.store(&UploadedFile::new("a.json", RECORDS)).unwrap();
        fs::create_dir(service.root().join("manual")).unwrap();
        fs::write(service.root().join("manual/deep.json"), b"{}").unwrap();

        let listed = names(&service);
        assert_eq!(listed, vec!["a.json", "manual"]);
        assert!(!listed.iter().any(|n| n.contains("deep.json")));
    }

    #[test]
    fn test_temp_namespace_name_rejected() {
        let temp = TempDir::new().unwrap();
        let vectors = Arc::new(InMemoryVectorStore::new());
        let service = service_in(&temp, vectors.clone());

        let err = service
            .store(&UploadedFile::new(".notes.part", RECORDS))
            .unwrap_err();
        assert!(matches!(err, StorageError::ReservedFilename(_)));
        assert!(!service.root().join(".notes.part").exists());
        assert!(vectors.is_empty());
    }

    #[test]
    fn test_listing_skips_in_flight_uploads() {
        let temp = TempDir::new().unwrap();
        let service = service_in(&temp, Arc::new(InMemoryVectorStore::new()));
        service.store(&UploadedFile::new(".hidden.json", RECORDS)).unwrap();
        fs::write(service.root().join(".0b7e.part"), b"partial").unwrap();

        assert_eq!(names(&service), vec![".hidden.json"]);
    }
}
