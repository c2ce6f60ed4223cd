//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, and the conversion
//! of parsed arguments into build [`Settings`].

use crate::bundler::{DuplicatePolicy, Platform, Settings, SettingsBuilder};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Browser extension packager
#[derive(Parser, Debug)]
#[command(
    name = "webext_bundler",
    version,
    about = "Packages browser extensions for Chrome, Gecko and Edge",
    long_about = "Packages a browser extension source directory into a store-ready archive.

Build metadata is read from metadata.<type>.toml in the base directory.

Usage:
  webext_bundler -t chrome build -k key.pem
  webext_bundler -d adblockplus -t gecko build -r
  webext_bundler -t chrome devenv

Exit code 0 = package written."
)]
pub struct Args {
    /// Extension source directory
    #[arg(
        short = 'd',
        long,
        value_name = "DIR",
        default_value = ".",
        env = "WEBEXT_BUNDLER_BASE_DIR"
    )]
    pub base_dir: PathBuf,

    /// Target platform
    #[arg(short = 't', long = "type", value_enum, value_name = "TYPE")]
    pub platform: Platform,

    /// Which value survives when an imported locale message already exists
    #[arg(long, value_enum, value_name = "POLICY", default_value_t = DuplicatePolicy::LastWins)]
    pub duplicate_locale_keys: DuplicatePolicy,

    #[command(subcommand)]
    pub command: Command,
}

/// What to build
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a package
    Build {
        /// Release build: the version gets no build number
        #[arg(short, long)]
        release: bool,

        /// Build number appended to the version of non-release builds
        #[arg(short = 'b', long = "build-num", value_name = "NUM")]
        build_num: Option<String>,

        /// Private key to sign the package with (created if missing)
        #[arg(short = 'k', long = "key", value_name = "FILE")]
        key: Option<PathBuf>,

        /// Output file; defaults to <basename>-<version>.<ext> in the base directory
        #[arg(value_name = "OUTFILE")]
        outfile: Option<PathBuf>,
    },

    /// Write an unpacked development build to devenv.<type>
    Devenv,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_dir.is_dir() {
            return Err(format!(
                "Base directory {} does not exist",
                self.base_dir.display()
            ));
        }

        if let Command::Build {
            key: Some(key),
            outfile: Some(outfile),
            ..
        } = &self.command
        {
            if key == outfile {
                return Err("Key file and output file must differ".to_string());
            }
        }

        Ok(())
    }

    /// Build settings described by these arguments.
    pub fn to_settings(&self) -> crate::bundler::Result<Settings> {
        let mut builder = SettingsBuilder::new()
            .base_dir(&self.base_dir)
            .platform(self.platform)
            .duplicate_policy(self.duplicate_locale_keys);

        builder = match &self.command {
            Command::Build {
                release,
                build_num,
                key,
                outfile,
            } => {
                builder = builder.release(*release);
                if let Some(build_num) = build_num {
                    builder = builder.build_number(build_num.clone());
                }
                if let Some(key) = key {
                    builder = builder.key_file(key);
                }
                if let Some(outfile) = outfile {
                    builder = builder.output(outfile);
                }
                builder
            }
            Command::Devenv => builder.devenv(true),
        };

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_arguments_map_onto_settings() {
        let args = Args::try_parse_from([
            "webext_bundler",
            "-t",
            "chrome",
            "build",
            "-b",
            "42",
            "-k",
            "key.pem",
            "out.crx",
        ])
        .unwrap();

        let settings = args.to_settings().unwrap();
        assert_eq!(settings.platform(), Platform::Chrome);
        assert_eq!(settings.build_number(), Some("42"));
        assert!(!settings.release());
        assert_eq!(settings.key_file(), Some(std::path::Path::new("key.pem")));
        assert_eq!(settings.output(), Some(std::path::Path::new("out.crx")));
    }

    #[test]
    fn devenv_is_an_unsigned_release_build() {
        let args =
            Args::try_parse_from(["webext_bundler", "-t", "gecko", "devenv"]).unwrap();

        let settings = args.to_settings().unwrap();
        assert!(settings.devenv());
        assert!(settings.release());
        assert!(settings.key_file().is_none());
    }

    #[test]
    fn unknown_platform_is_rejected() {
        assert!(Args::try_parse_from(["webext_bundler", "-t", "opera", "build"]).is_err());
    }

    #[test]
    fn identical_key_and_output_fail_validation() {
        let args = Args::try_parse_from([
            "webext_bundler", "-t", "chrome", "build", "-k", "x.pem", "x.pem",
        ])
        .unwrap();
        assert!(args.validate().is_err());
    }
}
