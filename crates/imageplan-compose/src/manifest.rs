//! `versions.yaml` manifest loading and static checks.
//!
//! The manifest lists every image definition in build order, plus an
//! optional `cloudbuild:` section with default option values.

use std::collections::HashSet;
use std::path::Path;

use imageplan_common::config::OptionLayer;
use imageplan_common::error::{ImagePlanError, Result};
use serde::{Deserialize, Serialize};

/// Root node of a parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Image definitions, in manifest order.
    pub versions: Vec<ImageDefinition>,
    /// Default option values supplied by the manifest.
    #[serde(rename = "cloudbuild")]
    pub options: OptionLayer,
}

/// One buildable image as declared in the manifest.
///
/// Keys the compiler does not use (`from`, `packages`, `templateArgs`, ...)
/// are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageDefinition {
    /// Directory holding the Dockerfile.
    pub dir: String,
    /// Repository name under the registry.
    pub repo: String,
    /// Tags in declaration order; the first is the primary tag.
    pub tags: Vec<String>,
    /// Marks a pure builder image, built but never shipped.
    pub builder: bool,
    /// Image, relative to the registry, that produces this image.
    pub builder_image: Option<String>,
    /// Arguments passed to the builder image.
    pub builder_args: Vec<String>,
    /// Image name the builder image produces.
    pub image_name_from_builder: Option<String>,
    /// Catalog-relative names of tests that must not run for this image.
    pub exclude_tests: Vec<String>,
}

impl ImageDefinition {
    /// Returns the builder-image reference, treating an empty value as absent.
    #[must_use]
    pub fn builder_image(&self) -> Option<&str> {
        self.builder_image.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns the builder-derived image name, treating an empty value as absent.
    #[must_use]
    pub fn image_name_from_builder(&self) -> Option<&str> {
        self.image_name_from_builder
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

/// Reads and parses the manifest at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid manifest.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    tracing::info!(path = %path.display(), "loading manifest");

    let content = std::fs::read_to_string(path).map_err(|e| ImagePlanError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_manifest(&content, path)
}

/// Parses manifest text; `path` is only used for error context.
///
/// # Errors
///
/// Returns an error if the YAML is malformed.
pub fn parse_manifest(content: &str, path: &Path) -> Result<Manifest> {
    let manifest: Manifest =
        serde_yaml::from_str(content).map_err(|e| ImagePlanError::Manifest {
            path: path.to_path_buf(),
            source: e,
        })?;
    tracing::debug!(versions = manifest.versions.len(), "parsed manifest");
    Ok(manifest)
}

/// Validates image definitions for semantic correctness.
///
/// # Checks performed
///
/// 1. Every definition declares a directory and a repository, plus at least
///    one tag unless it is built by a builder image.
/// 2. No fully qualified `repo:tag` is declared twice.
/// 3. A builder-image reference comes with the image name it produces.
///
/// # Errors
///
/// Returns a manifest inconsistency error if any check fails.
pub fn validate<'a, I>(definitions: I) -> Result<()>
where
    I: IntoIterator<Item = &'a ImageDefinition>,
{
    let definitions: Vec<&ImageDefinition> = definitions.into_iter().collect();
    tracing::debug!(count = definitions.len(), "validating image definitions");
    check_required_fields(&definitions)?;
    check_duplicate_tags(&definitions)?;
    check_builder_references(&definitions)?;
    Ok(())
}

fn check_required_fields(definitions: &[&ImageDefinition]) -> Result<()> {
    for (index, def) in definitions.iter().enumerate() {
        if def.dir.is_empty() {
            return Err(ImagePlanError::inconsistency(format!(
                "version #{index} has no dir"
            )));
        }
        if def.repo.is_empty() {
            return Err(ImagePlanError::inconsistency(format!(
                "version in \"{}\" has no repo",
                def.dir
            )));
        }
        if def.tags.is_empty() && def.builder_image().is_none() {
            return Err(ImagePlanError::inconsistency(format!(
                "version in \"{}\" declares no tags",
                def.dir
            )));
        }
    }
    Ok(())
}

fn check_duplicate_tags(definitions: &[&ImageDefinition]) -> Result<()> {
    let mut seen = HashSet::new();
    for def in definitions {
        for tag in &def.tags {
            if !seen.insert((def.repo.as_str(), tag.as_str())) {
                return Err(ImagePlanError::inconsistency(format!(
                    "duplicate tag \"{}:{tag}\" in \"{}\"",
                    def.repo, def.dir
                )));
            }
        }
    }
    Ok(())
}

fn check_builder_references(definitions: &[&ImageDefinition]) -> Result<()> {
    for def in definitions {
        let Some(builder) = def.builder_image() else {
            continue;
        };
        if def.image_name_from_builder().is_none() {
            return Err(ImagePlanError::inconsistency(format!(
                "version in \"{}\" uses builder image \"{builder}\" but sets no imageNameFromBuilder",
                def.dir
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_definition(dir: &str, repo: &str, tags: &[&str]) -> ImageDefinition {
        ImageDefinition {
            dir: dir.into(),
            repo: repo.into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            ..ImageDefinition::default()
        }
    }

    #[test]
    fn parse_versions_and_options() {
        let yaml = r"
cloudbuild:
  registry: gcr.io/my-project
  enable_parallel: true
versions:
  - dir: debian/9
    repo: debian
    tags: ['9', latest]
    from: scratch
    packages:
      curl: '7.52'
    excludeTests:
      - tests/functional_tests/slow_test.yaml
  - dir: builder
    repo: java-builder
    tags: ['1']
    builder: true
  - dir: app
    repo: app
    tags: ['2']
    builderImage: java-builder:1
    builderArgs: ['--src', '/workspace/app']
    imageNameFromBuilder: gcr.io/my-project/app:2
";
        let manifest = parse_manifest(yaml, Path::new("versions.yaml")).expect("parse");
        assert_eq!(manifest.options.registry.as_deref(), Some("gcr.io/my-project"));
        assert_eq!(manifest.options.enable_parallel, Some(true));
        assert_eq!(manifest.versions.len(), 3);

        let debian = &manifest.versions[0];
        assert_eq!(debian.tags, vec!["9", "latest"]);
        assert_eq!(debian.exclude_tests.len(), 1);
        assert!(manifest.versions[1].builder);

        let app = &manifest.versions[2];
        assert_eq!(app.builder_image(), Some("java-builder:1"));
        assert_eq!(app.builder_args, vec!["--src", "/workspace/app"]);
        assert_eq!(app.image_name_from_builder(), Some("gcr.io/my-project/app:2"));
        assert!(validate(&manifest.versions).is_ok());
    }

    #[test]
    fn parse_without_options_section() {
        let yaml = "versions:\n  - dir: a\n    repo: foo\n    tags: ['1.0']\n";
        let manifest = parse_manifest(yaml, Path::new("v.yaml")).expect("parse");
        assert_eq!(manifest.options, OptionLayer::default());
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let err = parse_manifest("versions: [", Path::new("broken.yaml")).unwrap_err();
        assert!(matches!(err, ImagePlanError::Manifest { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn load_missing_manifest_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_manifest(&dir.path().join("versions.yaml")).unwrap_err();
        assert!(matches!(err, ImagePlanError::Io { .. }));
    }

    #[test]
    fn load_manifest_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("versions.yaml");
        std::fs::write(&path, "versions:\n  - dir: a\n    repo: foo\n    tags: [x]\n")
            .expect("write");
        let manifest = load_manifest(&path).expect("load");
        assert_eq!(manifest.versions[0].repo, "foo");
    }

    #[test]
    fn empty_builder_fields_count_as_absent() {
        let def = ImageDefinition {
            builder_image: Some(String::new()),
            image_name_from_builder: Some(String::new()),
            ..make_definition("a", "foo", &["1"])
        };
        assert_eq!(def.builder_image(), None);
        assert_eq!(def.image_name_from_builder(), None);
        assert!(validate(&[def]).is_ok());
    }

    #[test]
    fn validate_missing_tags_fails() {
        let err = validate(&[make_definition("a", "foo", &[])]).unwrap_err();
        assert!(err.to_string().contains("declares no tags"), "got: {err}");
    }

    #[test]
    fn validate_builder_image_without_tags_succeeds() {
        let def = ImageDefinition {
            builder_image: Some("x/base".into()),
            image_name_from_builder: Some("gcr.io/proj/app:2".into()),
            ..make_definition("app", "app", &[])
        };
        assert!(validate(&[def]).is_ok());
    }

    #[test]
    fn validate_missing_repo_fails() {
        let err = validate(&[make_definition("a", "", &["1"])]).unwrap_err();
        assert!(err.to_string().contains("no repo"), "got: {err}");
    }

    #[test]
    fn validate_duplicate_tag_fails() {
        let defs = [
            make_definition("a", "foo", &["1", "latest"]),
            make_definition("b", "foo", &["2", "latest"]),
        ];
        let err = validate(&defs).unwrap_err();
        assert!(err.to_string().contains("foo:latest"), "got: {err}");
    }

    #[test]
    fn validate_same_tag_in_different_repos_succeeds() {
        let defs = [
            make_definition("a", "foo", &["latest"]),
            make_definition("b", "bar", &["latest"]),
        ];
        assert!(validate(&defs).is_ok());
    }

    #[test]
    fn validate_builder_without_derived_name_fails() {
        let def = ImageDefinition {
            builder_image: Some("x/base".into()),
            ..make_definition("app", "app", &["1"])
        };
        let err = validate(&[def]).unwrap_err();
        assert!(matches!(err, ImagePlanError::ManifestInconsistency { .. }));
        assert!(err.to_string().contains("imageNameFromBuilder"));
    }
}
