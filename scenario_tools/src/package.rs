//! Builds a co-simulation `.fmu`: a zip archive holding `modelDescription.xml` and the
//! compiled `scenario_fmu` library under `binaries/<platform>/`.

use crate::describe::{MODEL_IDENTIFIER, ModelArgs, ModelDescription, describe};
use anyhow::{Context, Result, bail};
use clap::Args;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

#[derive(Args, Debug)]
pub struct PackageArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Built `scenario_fmu` shared library. Looked up next to this executable if omitted.
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// FMI platform folder, e.g. linux64 or win64. Defaults to the host platform.
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Path of the .fmu to write
    #[arg(short, long, default_value = "scenario.fmu")]
    pub output: PathBuf,
}

/// The `binaries/` folder names FMI 2.0 defines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    Linux32,
    Linux64,
    Darwin32,
    Darwin64,
    Win32,
    Win64,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn host() -> Result<Self> {
        let wide = cfg!(target_pointer_width = "64");
        Ok(match std::env::consts::OS {
            "linux" if wide => Platform::Linux64,
            "linux" => Platform::Linux32,
            "macos" if wide => Platform::Darwin64,
            "macos" => Platform::Darwin32,
            "windows" if wide => Platform::Win64,
            "windows" => Platform::Win32,
            other => bail!("no FMI 2.0 platform folder for {other}, pass --platform"),
        })
    }

    pub fn folder(self) -> &'static str {
        match self {
            Platform::Linux32 => "linux32",
            Platform::Linux64 => "linux64",
            Platform::Darwin32 => "darwin32",
            Platform::Darwin64 => "darwin64",
            Platform::Win32 => "win32",
            Platform::Win64 => "win64",
        }
    }

    fn library_extension(self) -> &'static str {
        match self {
            Platform::Linux32 | Platform::Linux64 => "so",
            Platform::Darwin32 | Platform::Darwin64 => "dylib",
            Platform::Win32 | Platform::Win64 => "dll",
        }
    }

    /// Where the library goes inside the archive. FMI names it after the model
    /// identifier, without the `lib` prefix.
    pub fn library_entry(self) -> String {
        format!(
            "binaries/{}/{MODEL_IDENTIFIER}.{}",
            self.folder(),
            self.library_extension()
        )
    }
}

/// Where cargo puts the `scenario_fmu` cdylib: the same target directory as this binary.
fn built_library() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("locating scenario-tools")?;
    let dir = exe
        .parent()
        .context("scenario-tools has no parent directory")?;
    Ok(dir.join(format!("{DLL_PREFIX}{MODEL_IDENTIFIER}{DLL_SUFFIX}")))
}

/// Writes the archive for `description` to `output`, creating parent directories.
pub fn package(
    description: &ModelDescription,
    library: &Path,
    platform: Platform,
    output: &Path,
) -> Result<()> {
    let binary = fs::read(library)
        .with_context(|| format!("reading shared library {}", library.display()))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut archive = ZipWriter::new(file);

    debug!("adding modelDescription.xml");
    archive.start_file("modelDescription.xml", options)?;
    archive.write_all(description.to_xml().as_bytes())?;

    let entry = platform.library_entry();
    debug!(entry, bytes = binary.len(), "adding library");
    archive.start_file(entry.as_str(), options)?;
    archive.write_all(&binary)?;

    archive
        .finish()
        .with_context(|| format!("finishing {}", output.display()))?;
    Ok(())
}

pub fn run(args: PackageArgs) -> Result<()> {
    let description = describe(&args.model)?;
    let library = match args.library {
        Some(library) => library,
        None => built_library()?,
    };
    let platform = match args.platform {
        Some(platform) => platform,
        None => Platform::host()?,
    };

    package(&description, &library, platform, &args.output)?;
    info!(
        fmu = %args.output.display(),
        model_identifier = MODEL_IDENTIFIER,
        model_name = %description.model_name,
        guid = %description.guid,
        outputs = description.outputs,
        platform = platform.folder(),
        "created FMU"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_entries() {
        assert_eq!(
            Platform::Linux64.library_entry(),
            "binaries/linux64/scenario_fmu.so"
        );
        assert_eq!(
            Platform::Darwin64.library_entry(),
            "binaries/darwin64/scenario_fmu.dylib"
        );
        assert_eq!(Platform::Win32.library_entry(), "binaries/win32/scenario_fmu.dll");
    }

    #[cfg(all(target_os = "linux", target_pointer_width = "64"))]
    #[test]
    fn host_platform() {
        assert_eq!(Platform::host().unwrap(), Platform::Linux64);
    }

    #[test]
    fn built_library_is_a_shared_library() {
        let name = built_library().unwrap();
        let name = name.file_name().unwrap().to_string_lossy();
        assert!(name.contains(MODEL_IDENTIFIER));
        assert!(name.ends_with(DLL_SUFFIX));
    }
}
