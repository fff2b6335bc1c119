//! Settings saving.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{SettingsDescriptor, WriteMode};
use crate::discovery::discover;
use crate::error::{Result, SettingsError};
use crate::format::PersistedMapping;
use crate::handler::HookContext;
use crate::member::{MemberTable, Reflect};

impl<T: Reflect> SettingsDescriptor<T> {
    /// Save the marked members of `target` to the descriptor's file.
    ///
    /// Empty discovery is handed to the decision handler and nothing is
    /// written. The file handle is released on every path out.
    pub fn save(&self, target: &T) -> Result<()> {
        let cx = HookContext::new(self);
        let table = MemberTable::<T>::of();
        let discovery = discover(
            &table,
            Some(target),
            &self.filter,
            &self.marker,
            self.include_properties,
        );

        if discovery.is_empty() {
            tracing::debug!(descriptor = %self.id, "No members to save");
            return self.handler.on_no_members_found(&cx, target);
        }

        let mapping = discovery.snapshot();
        if mapping.is_empty() {
            tracing::debug!(descriptor = %self.id, "No marked members to save");
            return self.handler.on_no_marked_members_found(&cx, target);
        }

        match self.write_mode {
            WriteMode::Truncate => self.write_truncate(&mapping)?,
            WriteMode::Atomic => self.write_atomic(&mapping)?,
        }

        tracing::info!(
            "Saved {} settings to {}",
            mapping.len(),
            self.path.display()
        );
        Ok(())
    }

    fn write_truncate(&self, mapping: &PersistedMapping) -> Result<()> {
        create_parent_dir(&self.path)?;

        let file =
            File::create(&self.path).map_err(|e| SettingsError::io("create", &self.path, e))?;
        self.encode_to_file(file, &self.path, mapping)?;
        Ok(())
    }

    /// Write to a temp file first, then rename it over the target.
    fn write_atomic(&self, mapping: &PersistedMapping) -> Result<()> {
        create_parent_dir(&self.path)?;

        let temp_path = temp_path_for(&self.path);
        let file =
            File::create(&temp_path).map_err(|e| SettingsError::io("create", &temp_path, e))?;

        let written = self
            .encode_to_file(file, &temp_path, mapping)
            .and_then(|file| {
                file.sync_all()
                    .map_err(|e| SettingsError::io("sync", &temp_path, e))
            });
        if let Err(err) = written {
            // Best effort; the original error is what matters.
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        fs::rename(&temp_path, &self.path).map_err(|e| SettingsError::io("replace", &self.path, e))
    }

    fn encode_to_file(&self, file: File, path: &Path, mapping: &PersistedMapping) -> Result<File> {
        let mut writer = BufWriter::new(file);
        self.format.encode(mapping, &mut writer)?;
        writer.flush().map_err(|e| SettingsError::io("write", path, e))?;
        writer
            .into_inner()
            .map_err(|e| SettingsError::io("write", path, e.into_error()))
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| SettingsError::io("create directory", parent, e)),
        _ => Ok(()),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            let mut temp = name.to_os_string();
            temp.push(".tmp");
            path.with_file_name(temp)
        }
        None => path.with_extension("tmp"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::tempdir;

    use super::*;
    use crate::format::FormatAdapter;
    use crate::handler::PolicyHandler;
    use crate::test_support::{Counter, Opaque, SerdeFormat, Unmarked};
    use crate::value::Value;

    fn read_back(path: &Path) -> PersistedMapping {
        let mut file = File::open(path).unwrap();
        SerdeFormat.decode(&mut file).unwrap().unwrap()
    }

    fn sample() -> Counter {
        Counter {
            label: "clicks".to_string(),
            count: 12,
            ratio: None,
            scratch: 99,
        }
    }

    #[test]
    fn test_save_marked_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        let descriptor = SettingsDescriptor::<Counter>::builder(&path, SerdeFormat)
            .build()
            .unwrap();

        descriptor.save(&sample()).unwrap();

        let saved = read_back(&path);
        let names: Vec<_> = saved.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["label", "count", "ratio"]);
        assert_eq!(saved.get("count"), Some(&Value::U32(12)));
        assert_eq!(saved.get("ratio"), Some(&Value::Null));
    }

    #[test]
    fn test_save_includes_properties_when_enabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        let descriptor = SettingsDescriptor::<Counter>::builder(&path, SerdeFormat)
            .include_properties(true)
            .build()
            .unwrap();

        descriptor.save(&sample()).unwrap();

        assert_eq!(read_back(&path).get("doubled"), Some(&Value::U32(24)));
    }

    #[test]
    fn test_save_twice_is_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        let descriptor = SettingsDescriptor::<Counter>::builder(&path, SerdeFormat)
            .build()
            .unwrap();
        let counter = sample();

        descriptor.save(&counter).unwrap();
        let first = fs::read(&path).unwrap();
        descriptor.save(&counter).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_save_without_members() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("opaque.dat");
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let descriptor = SettingsDescriptor::<Opaque>::builder(&path, SerdeFormat)
            .handler(PolicyHandler::new().with_no_members_found(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .build()
            .unwrap();

        descriptor.save(&Opaque).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_save_without_members_is_fatal_by_default() {
        let dir = tempdir().unwrap();
        let descriptor = SettingsDescriptor::<Opaque>::builder(dir.path().join("o.dat"), SerdeFormat)
            .build()
            .unwrap();
        assert!(matches!(
            descriptor.save(&Opaque),
            Err(SettingsError::NoMembersFound { .. })
        ));
    }

    #[test]
    fn test_save_without_marked_members() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unmarked.dat");
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let descriptor = SettingsDescriptor::<Unmarked>::builder(&path, SerdeFormat)
            .handler(PolicyHandler::new().with_no_marked_members_found(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .build()
            .unwrap();

        descriptor.save(&Unmarked { width: 3 }).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_atomic_save_creates_parent_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("counter.dat");
        let descriptor = SettingsDescriptor::<Counter>::builder(&path, SerdeFormat)
            .write_mode(WriteMode::Atomic)
            .build()
            .unwrap();

        descriptor.save(&sample()).unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
        assert_eq!(read_back(&path).len(), 3);
    }

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("dir/settings.json")),
            PathBuf::from("dir/settings.json.tmp")
        );
    }
}
