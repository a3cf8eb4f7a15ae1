// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::PathBuf;

use log::debug;

use crate::{assemble, ComputePcr7, Error, KeyStore, KeysetReference, Result, Sink};

/// Parsed options of `computePCR7`.
#[derive(Debug, Clone, bon::Builder)]
pub struct ComputePcr7Options {
    #[builder(into)]
    pub keyset: String,
    /// Report file; absent or empty writes to stdout.
    pub output: Option<PathBuf>,
    /// Prepend the raw event trace.
    #[builder(default = false)]
    pub events: bool,
}

impl ComputePcr7Options {
    /// Builds the options from the raw positional arguments, which must hold
    /// exactly the keyset name.
    pub fn from_args(args: &[String], output: Option<PathBuf>, events: bool) -> Result<Self> {
        let [keyset] = args else {
            return Err(Error::InvalidUsage("Required argument: keysetName"));
        };
        Ok(Self {
            keyset: keyset.clone(),
            output,
            events,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.keyset.is_empty() {
            return Err(Error::InvalidUsage("Please specify a keyset name"));
        }
        Ok(())
    }

    /// Resolves the keyset, computes its PCR7 values and renders the report.
    /// Nothing is written anywhere.
    pub fn report(&self, store: &impl KeyStore, computer: &impl ComputePcr7) -> Result<Vec<u8>> {
        self.validate()?;
        let keyset = KeysetReference::resolve(store, &self.keyset)?;
        debug!("resolved keyset {} at {}", keyset.name(), keyset.path().display());

        let data = computer
            .compute_pcr7(keyset.name())
            .map_err(|source| Error::ComputationFailed {
                keyset: keyset.name().to_string(),
                source,
            })?;
        debug!("computed pcr7 values for {}", keyset.name());

        assemble(&data, self.events)
    }

    /// Runs the whole command. `stdout` receives the report unless an output
    /// file was requested.
    pub fn run(
        &self,
        store: &impl KeyStore,
        computer: &impl ComputePcr7,
        stdout: &mut dyn Write,
    ) -> Result<()> {
        let sink = Sink::from_output(self.output.as_deref());
        let report = self.report(store, computer)?;
        sink.deliver(&report, stdout)?;
        debug!("delivered pcr7 report to {sink:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::Path;

    use anyhow::anyhow;

    use crate::Pcr7Data;

    struct FakeStore {
        root: PathBuf,
        lookups: Cell<usize>,
    }

    impl FakeStore {
        fn new(root: &Path) -> Self {
            Self {
                root: root.to_path_buf(),
                lookups: Cell::new(0),
            }
        }
    }

    impl KeyStore for FakeStore {
        fn trust_dir(&self) -> anyhow::Result<PathBuf> {
            self.lookups.set(self.lookups.get() + 1);
            Ok(self.root.clone())
        }
    }

    #[derive(Default)]
    struct FakeComputer {
        calls: Cell<usize>,
        fail: bool,
    }

    impl ComputePcr7 for FakeComputer {
        fn compute_pcr7(&self, keyset: &str) -> anyhow::Result<Pcr7Data> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(anyhow!("no certificates for {keyset}"));
            }
            Ok(Pcr7Data {
                events: b"events\n".to_vec(),
                production: vec![0xaa; 32],
                limited: vec![0x00; 32],
                tpm: vec![0x01; 32],
            })
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_arity() {
        assert!(matches!(
            ComputePcr7Options::from_args(&args(&[]), None, false),
            Err(Error::InvalidUsage(_))
        ));
        assert!(matches!(
            ComputePcr7Options::from_args(&args(&["a", "b"]), None, false),
            Err(Error::InvalidUsage(_))
        ));
        let options = ComputePcr7Options::from_args(&args(&["demo"]), None, true).unwrap();
        assert_eq!(options.keyset, "demo");
        assert!(options.events);
    }

    #[test]
    fn test_empty_keyset_name_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let store = FakeStore::new(root.path());
        let computer = FakeComputer::default();

        let options = ComputePcr7Options::builder().keyset("").build();
        let err = options.report(&store, &computer).unwrap_err();

        assert_eq!(err.to_string(), "Please specify a keyset name");
        assert_eq!(store.lookups.get(), 0);
        assert_eq!(computer.calls.get(), 0);
    }

    #[test]
    fn test_missing_keyset_skips_computation() {
        let root = tempfile::tempdir().unwrap();
        let store = FakeStore::new(root.path());
        let computer = FakeComputer::default();

        let options = ComputePcr7Options::builder().keyset("demo").build();
        let err = options.report(&store, &computer).unwrap_err();

        assert!(matches!(err, Error::KeysetNotFound { .. }));
        assert_eq!(computer.calls.get(), 0);
    }

    #[test]
    fn test_computation_failure_is_wrapped() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("demo")).unwrap();
        let store = FakeStore::new(root.path());
        let computer = FakeComputer {
            fail: true,
            ..Default::default()
        };

        let options = ComputePcr7Options::builder().keyset("demo").build();
        let mut out: Vec<u8> = Vec::new();
        let err = options.run(&store, &computer, &mut out).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to generate pcr7 values for demo keyset"
        );
        let Error::ComputationFailed { keyset, source } = err else {
            panic!("unexpected error kind");
        };
        assert_eq!(keyset, "demo");
        assert_eq!(source.to_string(), "no certificates for demo");
        assert!(out.is_empty());
    }

    #[test]
    fn test_demo_report_on_stdout() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("demo")).unwrap();
        let store = FakeStore::new(root.path());
        let computer = FakeComputer::default();

        let options = ComputePcr7Options::builder().keyset("demo").build();
        let mut out: Vec<u8> = Vec::new();
        options.run(&store, &computer, &mut out).unwrap();

        let expected = format!(
            "uki-production: {}\nuki-limited: {}\nuki-tpm: {}\n",
            "aa".repeat(32),
            "00".repeat(32),
            "01".repeat(32)
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(computer.calls.get(), 1);
    }

    #[test]
    fn test_file_matches_stdout() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("demo")).unwrap();
        let store = FakeStore::new(root.path());
        let computer = FakeComputer::default();
        let report_path = root.path().join("pcr7.txt");

        let mut stdout: Vec<u8> = Vec::new();
        ComputePcr7Options::builder()
            .keyset("demo")
            .events(true)
            .build()
            .run(&store, &computer, &mut stdout)
            .unwrap();

        let mut unused: Vec<u8> = Vec::new();
        ComputePcr7Options::builder()
            .keyset("demo")
            .events(true)
            .output(report_path.clone())
            .build()
            .run(&store, &computer, &mut unused)
            .unwrap();

        assert!(unused.is_empty());
        assert!(stdout.starts_with(b"events\n"));
        assert_eq!(std::fs::read(&report_path).unwrap(), stdout);
    }

    #[test]
    fn test_failed_run_writes_no_file() {
        let root = tempfile::tempdir().unwrap();
        let store = FakeStore::new(root.path());
        let report_path = root.path().join("pcr7.txt");

        let options = ComputePcr7Options::builder()
            .keyset("absent")
            .output(report_path.clone())
            .build();
        assert!(options
            .run(&store, &FakeComputer::default(), &mut Vec::<u8>::new())
            .is_err());
        assert!(!report_path.exists());
    }
}
