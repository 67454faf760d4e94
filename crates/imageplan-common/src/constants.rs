//! Fixed names, paths, and builder images used by compiled plans.

/// Default manifest file name, relative to the workspace directory.
pub const DEFAULT_MANIFEST_FILE: &str = "versions.yaml";

/// Legacy root holding structure tests.
pub const TESTS_DIR: &str = "tests";

/// Root holding structure tests.
pub const STRUCTURE_TESTS_DIR: &str = "tests/structure_tests";

/// Root holding functional tests.
pub const FUNCTIONAL_TESTS_DIR: &str = "tests/functional_tests";

/// Recognized test descriptor suffixes.
pub const TEST_SUFFIXES: [&str; 2] = ["_test.json", "_test.yaml"];

/// Prefix under which the build host mounts the workspace.
pub const WORKSPACE_PREFIX: &str = "/workspace/";

/// Machine class forced onto every parallel plan.
pub const PARALLEL_MACHINE_TYPE: &str = "E2_HIGHCPU_8";

/// Machine classes accepted for the `machine_type` option.
pub const KNOWN_MACHINE_TYPES: [&str; 4] =
    ["N1_HIGHCPU_8", "N1_HIGHCPU_32", "E2_HIGHCPU_8", "E2_HIGHCPU_32"];

/// Builder used for direct image builds and alias tagging.
pub const DOCKER_BUILDER: &str = "gcr.io/cloud-builders/docker";

/// Builder verifying that a tag is not yet present in the registry.
pub const TAG_CHECK_BUILDER: &str = "gcr.io/gcp-runtimes/check_if_tag_exists";

/// Builder running container structure tests.
pub const STRUCTURE_TEST_BUILDER: &str = "gcr.io/gcp-runtimes/structure_test";

/// Builder running functional tests.
pub const FUNCTIONAL_TEST_BUILDER: &str = "gcr.io/$PROJECT_ID/functional_test";

/// Scheduling marker meaning "start as soon as the build begins".
pub const START_IMMEDIATELY: &str = "-";
