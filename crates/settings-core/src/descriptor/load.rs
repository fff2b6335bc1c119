//! Settings loading.

use std::fs::File;
use std::io::{self, BufReader, Read};

use super::SettingsDescriptor;
use crate::discovery::{Discovery, discover};
use crate::error::{Result, SettingsError};
use crate::format::PersistedMapping;
use crate::handler::{HookContext, NoTargetMemberOutcome, PayloadOutcome};
use crate::member::{Member, MemberTable, Reflect};
use crate::value::Value;

impl<T: Reflect> SettingsDescriptor<T> {
    /// Load the descriptor's file into the marked members of `target`.
    ///
    /// Entries are applied in file order. A `Break` from the handler stops
    /// the load where it is; members already written keep their new values.
    pub fn load(&self, target: &mut T) -> Result<()> {
        let cx = HookContext::new(self);
        let table = MemberTable::<T>::of();
        let discovery = discover(
            &table,
            None,
            &self.filter,
            &self.marker,
            self.include_properties,
        );

        if discovery.is_empty() {
            tracing::debug!(descriptor = %self.id, "No members to load");
            return self.handler.on_no_members_found(&cx, target);
        }

        let Some(mut reader) = self.open(&cx, target)? else {
            tracing::debug!(descriptor = %self.id, "No settings file, load aborted");
            return Ok(());
        };
        let decoded = self.format.decode(&mut reader);
        drop(reader);

        let mapping = match decoded? {
            Some(mapping) if !mapping.is_empty() => mapping,
            _ => return self.handler.on_empty_load_file(&cx, target),
        };

        let total = mapping.len();
        let applied = self.apply(&cx, &discovery, target, mapping)?;
        tracing::info!(
            "Loaded {} of {} settings from {}",
            applied,
            total,
            self.path.display()
        );
        Ok(())
    }

    /// Open the settings file, or ask the handler for a stand-in.
    fn open(&self, cx: &HookContext<'_, T>, target: &mut T) -> Result<Option<Box<dyn Read>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.handler.on_no_file_found(cx, target)
            }
            Err(e) => Err(SettingsError::io("open", &self.path, e)),
        }
    }

    /// Apply decoded entries in order. Returns how many members were written.
    fn apply(
        &self,
        cx: &HookContext<'_, T>,
        discovery: &Discovery<'_, T>,
        target: &mut T,
        mapping: PersistedMapping,
    ) -> Result<usize> {
        let mut applied = 0;

        for (name, mut value) in mapping {
            let Some(record) = discovery.find(&name) else {
                match self
                    .handler
                    .on_no_target_member_found(cx, target, &name, &value)?
                {
                    NoTargetMemberOutcome::Continue => continue,
                    NoTargetMemberOutcome::Break => {
                        tracing::warn!(entry = %name, "Load stopped at unknown member");
                        break;
                    }
                }
            };

            if !record.is_marked() {
                tracing::debug!(member = %name, "Ignoring unmarked member");
                continue;
            }

            let member = record.member();
            match self.payload_outcome(cx, target, member, &mut value)? {
                PayloadOutcome::ExplicitSet => {
                    member.write(target, value).map_err(|rejected| SettingsError::Coercion {
                        member: name.clone(),
                        expected: member.declared_type(),
                        found: rejected.type_name(),
                    })?;
                    applied += 1;
                }
                PayloadOutcome::Skip => {
                    tracing::debug!(member = %name, "Skipped setting");
                }
                PayloadOutcome::Break => {
                    tracing::warn!(member = %name, "Load stopped at invalid setting");
                    break;
                }
            }
        }

        Ok(applied)
    }

    /// Decide whether `value` may go into `member` as is.
    fn payload_outcome(
        &self,
        cx: &HookContext<'_, T>,
        target: &mut T,
        member: &Member<T>,
        value: &mut Value,
    ) -> Result<PayloadOutcome> {
        let expected = member.declared_type();

        if value.is_null() {
            if expected.nullable {
                Ok(PayloadOutcome::ExplicitSet)
            } else {
                self.handler.on_non_nullable_null(cx, target, member, value)
            }
        } else if !value.is_assignable_to(expected) {
            self.handler.on_type_mismatch(cx, target, member, value)
        } else {
            Ok(PayloadOutcome::ExplicitSet)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::tempdir;

    use super::*;
    use crate::handler::{CreateDefaultsHandler, PolicyHandler};
    use crate::test_support::{Counter, Opaque, SerdeFormat, encoded};

    fn descriptor_with(
        path: &Path,
        handler: PolicyHandler<Counter>,
    ) -> SettingsDescriptor<Counter> {
        SettingsDescriptor::builder(path, SerdeFormat)
            .handler(handler)
            .build()
            .unwrap()
    }

    #[test]
    fn test_load_applies_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(
            &path,
            encoded(&[
                ("count", Value::U32(5)),
                ("label", Value::String("loaded".into())),
                ("ratio", Value::F64(0.25)),
            ]),
        )
        .unwrap();
        let descriptor = SettingsDescriptor::<Counter>::builder(&path, SerdeFormat)
            .build()
            .unwrap();

        let mut counter = Counter::default();
        descriptor.load(&mut counter).unwrap();

        assert_eq!(counter.count, 5);
        assert_eq!(counter.label, "loaded");
        assert_eq!(counter.ratio, Some(0.25));
    }

    #[test]
    fn test_unmarked_member_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(
            &path,
            encoded(&[("scratch", Value::I64(1)), ("count", Value::U32(2))]),
        )
        .unwrap();
        // Fatal handler: any hook call would fail the load.
        let descriptor = SettingsDescriptor::<Counter>::builder(&path, SerdeFormat)
            .build()
            .unwrap();

        let mut counter = Counter::default();
        descriptor.load(&mut counter).unwrap();

        assert_eq!(counter.scratch, 0);
        assert_eq!(counter.count, 2);
    }

    #[test]
    fn test_unknown_member_continue_and_break() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(
            &path,
            encoded(&[
                ("count", Value::U32(1)),
                ("missing", Value::Bool(true)),
                ("label", Value::String("after".into())),
            ]),
        )
        .unwrap();

        let skipping = descriptor_with(
            &path,
            PolicyHandler::new()
                .with_no_target_member_found(|_, _, _, _| Ok(NoTargetMemberOutcome::Continue)),
        );
        let mut counter = Counter::default();
        skipping.load(&mut counter).unwrap();
        assert_eq!((counter.count, counter.label.as_str()), (1, "after"));

        let stopping = descriptor_with(
            &path,
            PolicyHandler::new()
                .with_no_target_member_found(|_, _, _, _| Ok(NoTargetMemberOutcome::Break)),
        );
        let mut counter = Counter::default();
        stopping.load(&mut counter).unwrap();
        assert_eq!((counter.count, counter.label.as_str()), (1, ""));
    }

    #[test]
    fn test_unknown_member_is_fatal_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(&path, encoded(&[("missing", Value::Bool(true))])).unwrap();
        let descriptor = descriptor_with(&path, PolicyHandler::new());

        let err = descriptor.load(&mut Counter::default()).unwrap_err();
        assert!(matches!(err, SettingsError::NoTargetMember { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_type_mismatch_outcomes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(&path, encoded(&[("count", Value::String("ten".into()))])).unwrap();

        let fatal = descriptor_with(&path, PolicyHandler::new());
        let mut counter = Counter::default();
        assert!(matches!(
            fatal.load(&mut counter),
            Err(SettingsError::TypeMismatch { .. })
        ));

        let skipping = descriptor_with(
            &path,
            PolicyHandler::new().with_type_mismatch(|_, _, _, _| Ok(PayloadOutcome::Skip)),
        );
        let mut counter = Counter {
            count: 3,
            ..Default::default()
        };
        skipping.load(&mut counter).unwrap();
        assert_eq!(counter.count, 3);

        let replacing = descriptor_with(
            &path,
            PolicyHandler::new().with_type_mismatch(|_, _, _, value| {
                *value = Value::U32(10);
                Ok(PayloadOutcome::ExplicitSet)
            }),
        );
        replacing.load(&mut counter).unwrap();
        assert_eq!(counter.count, 10);
    }

    #[test]
    fn test_explicit_set_of_unfit_value_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(&path, encoded(&[("count", Value::I64(4))])).unwrap();
        let descriptor = descriptor_with(
            &path,
            PolicyHandler::new().with_type_mismatch(|_, _, _, _| Ok(PayloadOutcome::ExplicitSet)),
        );

        let err = descriptor.load(&mut Counter::default()).unwrap_err();
        assert!(matches!(err, SettingsError::Coercion { found: "i64", .. }));
    }

    #[test]
    fn test_null_handling() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(
            &path,
            encoded(&[("ratio", Value::Null), ("count", Value::Null)]),
        )
        .unwrap();

        let fatal = descriptor_with(&path, PolicyHandler::new());
        let mut counter = Counter {
            ratio: Some(1.0),
            ..Default::default()
        };
        let err = fatal.load(&mut counter).unwrap_err();
        assert!(matches!(err, SettingsError::NonNullableNull { ref member, .. } if member == "count"));
        // The nullable member before the failure was already written.
        assert_eq!(counter.ratio, None);

        let defaulting = descriptor_with(
            &path,
            PolicyHandler::new().with_non_nullable_null(|_, _, _, value| {
                *value = Value::U32(0);
                Ok(PayloadOutcome::ExplicitSet)
            }),
        );
        let mut counter = Counter {
            count: 8,
            ..Default::default()
        };
        defaulting.load(&mut counter).unwrap();
        assert_eq!(counter.count, 0);
    }

    #[test]
    fn test_break_keeps_earlier_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(
            &path,
            encoded(&[
                ("label", Value::String("first".into())),
                ("count", Value::Bool(false)),
                ("ratio", Value::F64(2.0)),
            ]),
        )
        .unwrap();
        let descriptor = descriptor_with(
            &path,
            PolicyHandler::new().with_type_mismatch(|_, _, _, _| Ok(PayloadOutcome::Break)),
        );

        let mut counter = Counter::default();
        descriptor.load(&mut counter).unwrap();

        assert_eq!(counter.label, "first");
        assert_eq!(counter.count, 0);
        assert_eq!(counter.ratio, None);
    }

    #[test]
    fn test_handler_error_propagates_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(&path, encoded(&[("count", Value::Bool(true))])).unwrap();
        let descriptor = descriptor_with(
            &path,
            PolicyHandler::new().with_type_mismatch(|_, _, member, _| {
                Err(SettingsError::Handler(format!("refusing {}", member.name())))
            }),
        );

        match descriptor.load(&mut Counter::default()) {
            Err(SettingsError::Handler(message)) => assert_eq!(message, "refusing count"),
            other => panic!("expected handler error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_fatal_by_default() {
        let dir = tempdir().unwrap();
        let descriptor = descriptor_with(&dir.path().join("absent.dat"), PolicyHandler::new());
        assert!(matches!(
            descriptor.load(&mut Counter::default()),
            Err(SettingsError::NoFileFound { .. })
        ));
    }

    #[test]
    fn test_missing_file_substitute_stream() {
        let dir = tempdir().unwrap();
        let empties = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&empties);
        let descriptor = descriptor_with(
            &dir.path().join("absent.dat"),
            PolicyHandler::new()
                .with_no_file_found(|_, _| Ok(Some(Box::new(Cursor::new(Vec::new())))))
                .with_empty_load_file(move |_, _| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        );

        descriptor.load(&mut Counter::default()).unwrap();
        assert_eq!(empties.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_substitute_stream_is_decoded() {
        let dir = tempdir().unwrap();
        let descriptor = descriptor_with(
            &dir.path().join("absent.dat"),
            PolicyHandler::new().with_no_file_found(|_, _| {
                let defaults = encoded(&[("count", Value::U32(42))]);
                Ok(Some(Box::new(Cursor::new(defaults))))
            }),
        );

        let mut counter = Counter::default();
        descriptor.load(&mut counter).unwrap();
        assert_eq!(counter.count, 42);
    }

    #[test]
    fn test_create_defaults_handler_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        let descriptor = SettingsDescriptor::<Counter>::builder(&path, SerdeFormat)
            .handler(CreateDefaultsHandler::new())
            .build()
            .unwrap();

        let mut counter = Counter {
            count: 7,
            ..Default::default()
        };
        descriptor.load(&mut counter).unwrap();
        assert!(path.exists());

        let mut fresh = Counter::default();
        descriptor.load(&mut fresh).unwrap();
        assert_eq!(fresh.count, 7);
    }

    #[test]
    fn test_empty_file_is_fatal_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(&path, b"[]").unwrap();
        let descriptor = descriptor_with(&path, PolicyHandler::new());
        assert!(matches!(
            descriptor.load(&mut Counter::default()),
            Err(SettingsError::EmptyLoadFile { .. })
        ));
    }

    #[test]
    fn test_unparseable_file_reaches_empty_load_hook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.dat");
        fs::write(&path, b"[[\"count\"").unwrap();

        let empties = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&empties);
        let lenient = descriptor_with(
            &path,
            PolicyHandler::new().with_empty_load_file(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        let mut counter = Counter {
            count: 3,
            ..Default::default()
        };
        lenient.load(&mut counter).unwrap();
        assert_eq!(empties.load(Ordering::SeqCst), 1);
        assert_eq!(counter.count, 3);

        let strict = descriptor_with(&path, PolicyHandler::new());
        assert!(matches!(
            strict.load(&mut Counter::default()),
            Err(SettingsError::EmptyLoadFile { .. })
        ));
    }

    #[test]
    fn test_no_members_skips_file_io() {
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

        // The missing file would be fatal if it were ever opened.
        descriptor.load(&mut Opaque).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
