//! Keystore location and passphrase resolution

use crate::config::KeystoreSettings;
use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Versioned name of the keystore shipped with the recorder
pub const DEFAULT_KEYSTORE_RESOURCE: &str = "recorder-keystore-v1.p12";

/// Directories searched for system-wide resources, in order
pub const SYSTEM_RESOURCE_DIRS: &[&str] = &[
    "/etc/recorder",
    "/usr/local/share/recorder",
    "/usr/share/recorder",
];

static BUNDLED_RESOURCES: &[(&str, &[u8])] = &[(
    DEFAULT_KEYSTORE_RESOURCE,
    include_bytes!("../resources/recorder-keystore-v1.p12"),
)];

/// Where a credential stream was opened from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// Operator-supplied keystore path
    Override(PathBuf),
    /// Copy of the default resource found in a system resource directory
    SystemResource(PathBuf),
    /// Default resource compiled into this crate
    Bundled(&'static str),
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::Override(path) => write!(f, "keystore {}", path.display()),
            CredentialOrigin::SystemResource(path) => {
                write!(f, "system resource {}", path.display())
            }
            CredentialOrigin::Bundled(name) => write!(f, "bundled resource {name}"),
        }
    }
}

/// An opened keystore byte stream
///
/// Owned by whoever called [`CredentialResolver::resolve`]. Dropping it
/// releases the underlying file handle.
pub struct CredentialStream {
    origin: CredentialOrigin,
    reader: Box<dyn Read + Send>,
}

impl CredentialStream {
    fn new(origin: CredentialOrigin, reader: impl Read + Send + 'static) -> Self {
        Self {
            origin,
            reader: Box::new(reader),
        }
    }

    /// Where this stream was opened from
    pub fn origin(&self) -> &CredentialOrigin {
        &self.origin
    }

    /// Consume the stream, returning all remaining bytes
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for CredentialStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for CredentialStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStream")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// One strategy for locating a named resource
#[derive(Debug, Clone)]
pub enum ResourceLoader {
    /// Look for the resource as a file in each directory, in order
    System(Vec<PathBuf>),
    /// Look the resource up among the resources compiled into this crate
    Bundled,
}

impl ResourceLoader {
    /// System-wide loader over [`SYSTEM_RESOURCE_DIRS`]
    pub fn system() -> Self {
        ResourceLoader::System(SYSTEM_RESOURCE_DIRS.iter().map(PathBuf::from).collect())
    }

    /// Try to open `name`; `None` means this loader does not have it
    pub fn open(&self, name: &str) -> Option<CredentialStream> {
        match self {
            ResourceLoader::System(dirs) => dirs.iter().find_map(|dir| {
                let path = dir.join(name);
                match File::open(&path) {
                    Ok(file) => Some(CredentialStream::new(
                        CredentialOrigin::SystemResource(path),
                        BufReader::new(file),
                    )),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        debug!(path = %path.display(), "System resource not present");
                        None
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "Skipping unreadable system resource"
                        );
                        None
                    }
                }
            }),
            ResourceLoader::Bundled => BUNDLED_RESOURCES
                .iter()
                .find(|(bundled, _)| *bundled == name)
                .map(|(bundled, bytes)| {
                    CredentialStream::new(
                        CredentialOrigin::Bundled(*bundled),
                        Cursor::new(*bytes),
                    )
                }),
        }
    }
}

/// Locates the keystore stream and passphrase for the server identity
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    settings: KeystoreSettings,
    loaders: Vec<ResourceLoader>,
    resource: String,
}

impl CredentialResolver {
    /// Create a resolver that falls back to the system-wide, then the bundled,
    /// copy of [`DEFAULT_KEYSTORE_RESOURCE`]
    pub fn new(settings: KeystoreSettings) -> Self {
        Self {
            settings,
            loaders: vec![ResourceLoader::system(), ResourceLoader::Bundled],
            resource: DEFAULT_KEYSTORE_RESOURCE.to_string(),
        }
    }

    /// Replace the ordered list of default-resource loaders
    pub fn with_loaders(mut self, loaders: Vec<ResourceLoader>) -> Self {
        self.loaders = loaders;
        self
    }

    /// Look up a different default resource name
    pub fn with_resource(mut self, name: impl Into<String>) -> Self {
        self.resource = name.into();
        self
    }

    /// Settings this resolver reads overrides from
    pub fn settings(&self) -> &KeystoreSettings {
        &self.settings
    }

    /// Open the keystore stream and resolve its passphrase
    ///
    /// An explicit keystore path is never silently replaced by the default:
    /// if it cannot be opened this fails straight away.
    pub fn resolve(&self) -> Result<(CredentialStream, String)> {
        let stream = match &self.settings.keystore {
            Some(path) => open_override(path)?,
            None => self.open_default()?,
        };

        info!(origin = %stream.origin(), "Resolved keystore");

        Ok((stream, self.settings.password().to_string()))
    }

    fn open_default(&self) -> Result<CredentialStream> {
        for loader in &self.loaders {
            if let Some(stream) = loader.open(&self.resource) {
                return Ok(stream);
            }
        }

        Err(Error::CredentialUnavailable(format!(
            "default keystore resource {} not found",
            self.resource
        )))
    }
}

fn open_override(path: &Path) -> Result<CredentialStream> {
    let file = File::open(path).map_err(|e| {
        Error::CredentialUnavailable(format!(
            "failed to open keystore {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(CredentialStream::new(
        CredentialOrigin::Override(path.to_path_buf()),
        BufReader::new(file),
    ))
}
