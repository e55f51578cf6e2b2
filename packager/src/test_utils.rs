//! Shared test utilities for the packager crate.

use crate::error::{PackagerError, Result};
use crate::executor::{CommandExecutor, CommandSpec};
use camino::Utf8Path;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::process::{ExitStatus, Output};

/// File the fake CMake configure step leaves in its build tree.
const FAKE_CMAKE_CACHE: &str = "fake-cmake-output-dir";

/// Exit status carrying `code` (Unix).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Exit status carrying `code` (Windows).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Output of a command that exited 0 silently.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Output of a command that exited 1 after printing `stderr`.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// One invocation a [`StubExecutor`] expects, and what it answers.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program expected to run (for example `cmake`).
    pub program: String,
    /// Arguments that must be present, in order, somewhere in the invocation.
    pub args_contain: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `program` and return `result`.
    #[must_use]
    pub fn new(program: impl Into<String>, result: Result<Output>) -> Self {
        Self {
            program: program.into(),
            args_contain: Vec::new(),
            result,
        }
    }

    /// Require `arg` to appear in the invocation's arguments.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args_contain.push(arg.into());
        self
    }
}

/// Executor that answers a fixed queue of expected invocations.
///
/// Each call pops the next [`ExpectedCall`]; a program or argument mismatch,
/// or a call beyond the queue, fails with [`PackagerError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    received: RefCell<Vec<CommandSpec>>,
}

impl StubExecutor {
    /// Queue `expected` in invocation order.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            received: RefCell::new(Vec::new()),
        }
    }

    /// Invocations received so far.
    #[must_use]
    pub fn received(&self) -> Vec<CommandSpec> {
        self.received.borrow().clone()
    }

    /// Check the queue is drained.
    ///
    /// # Panics
    ///
    /// Panics if any expected invocation never happened.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected invocations were never made"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, spec: &CommandSpec) -> Result<Output> {
        self.received.borrow_mut().push(spec.clone());
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PackagerError::StubMismatch {
                message: format!("unexpected invocation: {spec}"),
            })?;

        if !spec.program.ends_with(&call.program) {
            return Err(PackagerError::StubMismatch {
                message: format!("expected program {}, got {}", call.program, spec.program),
            });
        }
        if let Some(missing) = call.args_contain.iter().find(|a| !spec.args.contains(a)) {
            return Err(PackagerError::StubMismatch {
                message: format!("argument {missing} missing from: {spec}"),
            });
        }

        call.result
    }
}

/// An executor that delegates every invocation to a closure.
///
/// Useful when a fake toolchain must create files as a side effect, the way
/// CMake writes shared objects into its output directory.
pub struct ScriptedExecutor<F> {
    handler: F,
    received: RefCell<Vec<CommandSpec>>,
}

impl<F> ScriptedExecutor<F>
where
    F: Fn(&CommandSpec) -> Result<Output>,
{
    /// Wrap `handler`.
    #[must_use]
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            received: RefCell::new(Vec::new()),
        }
    }

    /// Invocations received so far.
    #[must_use]
    pub fn received(&self) -> Vec<CommandSpec> {
        self.received.borrow().clone()
    }
}

impl<F> CommandExecutor for ScriptedExecutor<F>
where
    F: Fn(&CommandSpec) -> Result<Output>,
{
    fn run(&self, spec: &CommandSpec) -> Result<Output> {
        self.received.borrow_mut().push(spec.clone());
        (self.handler)(spec)
    }
}

/// Stand-in for the static build script and CMake.
///
/// - A command carrying `PROJECT_ROOT` acts as the static build script and
///   writes `libspatialite.a` into `static_libs/build/<abi>/lib` for each ABI
///   in `ABIS`.
/// - A command with `-B` acts as CMake configure and remembers the library
///   output directory in the build tree.
/// - A command with `--build` acts as CMake build and writes
///   `libspatialite.so` into the remembered output directory.
///
/// # Errors
///
/// Returns [`PackagerError::Io`] if a file cannot be written, or if a build
/// runs without a prior configure.
pub fn fake_toolchain(spec: &CommandSpec) -> Result<Output> {
    if let Some(root) = spec.env_value("PROJECT_ROOT") {
        let abis = spec.env_value("ABIS").unwrap_or_default();
        for abi in abis.split_whitespace() {
            let dir = Utf8Path::new(root)
                .join("static_libs/build")
                .join(abi)
                .join("lib");
            fs::create_dir_all(&dir)?;
            fs::write(dir.join("libspatialite.a"), "!<arch>\n")?;
        }
        return Ok(success_output());
    }

    if let (Some(build_dir), Some(out_dir)) = (
        spec.arg_after("-B"),
        spec.definition("CMAKE_LIBRARY_OUTPUT_DIRECTORY"),
    ) {
        fs::create_dir_all(build_dir)?;
        fs::write(Utf8Path::new(build_dir).join(FAKE_CMAKE_CACHE), out_dir)?;
        return Ok(success_output());
    }

    if let Some(build_dir) = spec.arg_after("--build") {
        let build_dir = Utf8Path::new(build_dir);
        let out_dir = fs::read_to_string(build_dir.join(FAKE_CMAKE_CACHE))?;
        let abi = build_dir.file_name().unwrap_or_default();
        fs::write(
            Utf8Path::new(&out_dir).join("libspatialite.so"),
            format!("ELF shared object for {abi}"),
        )?;
    }
    Ok(success_output())
}
