//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "gantry.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "gantry.yaml";

/// Get list of config file names to search for, in priority order
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".gantry.toml",
        ".gantry.yaml",
    ]
}

/// Bare task names taken by `gantry` subcommands
pub const RESERVED_TASK_NAMES: &[&str] = &["run", "list", "init", "completions", "help"];

/// Starter configuration written by `gantry init`: a backend plugin binary
/// cross-compiled with Go plus a frontend bundle built with grafana-toolkit.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Gantry build configuration
#
# Tasks run with `gantry run <task>`; namespaced tasks are addressed as
# `<namespace>.<task>`, e.g. `gantry run build.frontend`.

name = "sheets-datasource"
default = "buildAll"

[tasks.deps]
description = "Install dependencies"
command = "yarn"
args = ["install"]

[tasks.buildAll]
description = "Build both back-end and front-end components"
depends_on = ["build.backendLinux", "build.frontend"]

[tasks.dev]
description = "Build the plugin in dev mode"
depends_on = ["build.backendLinuxDebug", "build.frontendDev"]

[tasks.watch]
description = "Build the plugin in dev mode and rebuild when frontend files change"
depends_on = ["build.backendLinuxDebug"]
command = "./node_modules/.bin/grafana-toolkit"
args = ["plugin:dev", "--watch"]

[tasks.test]
description = "Run all tests"
depends_on = ["deps"]
steps = [
    { command = "go", args = ["test", "./pkg/..."] },
    { command = "yarn", args = ["test"] },
]

[tasks.lint]
description = "Lint the sources"
command = "golangci-lint"
args = ["run", "./..."]

[tasks.format]
description = "Format the sources"
command = "gofmt"
args = ["-w", "."]

[tasks.clean]
description = "Clean build artifacts by deleting the dist directory"
remove = ["dist"]

[namespaces.build.backendLinux]
description = "Build the back-end plugin for Linux"
command = "go"
args = ["build", "-o", "dist/sheets-datasource_linux_amd64", "-tags", "netgo", "-ldflags", "-w", "./pkg"]
env = { GOARCH = "amd64", GOOS = "linux" }
stream = false

[namespaces.build.backendLinuxDebug]
description = "Build the back-end plugin for Linux in debug mode"
command = "go"
args = ["build", "-o", "dist/sheets-datasource_linux_amd64", "-tags", "netgo", "-gcflags=all=-N -l", "./pkg"]
env = { GOARCH = "amd64", GOOS = "linux" }
stream = false

[namespaces.build.frontend]
description = "Build the front-end for production"
depends_on = ["deps"]
command = "./node_modules/.bin/grafana-toolkit"
args = ["plugin:build"]

[namespaces.build.frontendDev]
description = "Build the front-end for development"
depends_on = ["deps"]
command = "./node_modules/.bin/grafana-toolkit"
args = ["plugin:dev"]
"#;
