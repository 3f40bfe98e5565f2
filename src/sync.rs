//! Upload local site assets into the content bucket. Each file becomes an
//! independent, idempotent `PutObject` keyed by its path relative to the
//! asset root. Symlink cycles are not handled.

use std::path::{Path, PathBuf};

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use tracing::{debug, info};

use crate::errors::{Error, Result};

/// Which canned ACL uploaded objects carry. Public-bucket deployments
/// upload world-readable objects; CDN-gated deployments keep objects
/// private and let the origin access identity read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetAcl {
    PublicRead,
    Private,
}

impl AssetAcl {
    fn canned(self) -> ObjectCannedAcl {
        match self {
            AssetAcl::PublicRead => ObjectCannedAcl::PublicRead,
            AssetAcl::Private => ObjectCannedAcl::Private,
        }
    }
}

/// Recursively walk `start_dir`, applying `callback` to every regular
/// file found. Directories are descended into; anything else is skipped.
pub fn crawl_directory<P: AsRef<Path>>(
    start_dir: P,
    callback: &mut impl FnMut(PathBuf) -> Result<()>,
) -> Result<()> {
    let dir = start_dir.as_ref();
    let readdir = std::fs::read_dir(dir).map_err(|source| Error::AssetWalk {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in readdir {
        let direntry = entry.map_err(|source| Error::AssetWalk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = direntry.path();
        let file_type = direntry.file_type().map_err(|source| Error::AssetWalk {
            path: path.clone(),
            source,
        })?;
        if file_type.is_dir() {
            crawl_directory(&path, callback)?;
        } else if file_type.is_file() {
            callback(path)?;
        }
    }
    Ok(())
}

/// The object key for a file: its path relative to the asset root, with
/// forward slashes.
fn object_key(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Upload everything under `asset_dir` into `bucket`. Returns the number
/// of files uploaded. Re-running with unchanged files simply overwrites
/// each object with identical content.
pub async fn sync_assets(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    asset_dir: &Path,
    acl: AssetAcl,
) -> Result<usize> {
    let mut files = Vec::new();
    crawl_directory(asset_dir, &mut |path| {
        files.push(path);
        Ok(())
    })?;

    info!(
        bucket,
        count = files.len(),
        dir = %asset_dir.display(),
        "syncing assets to bucket"
    );
    let mut uploaded = 0;
    for path in files {
        let Some(key) = object_key(asset_dir, &path) else {
            continue;
        };
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|source| Error::AssetWalk {
                path: path.clone(),
                source,
            })?;
        let content_type = mime_guess::from_path(&path).first_raw();

        let mut request = client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .acl(acl.canned())
            .body(ByteStream::from(contents));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        request
            .send()
            .await
            .map_err(|e| Error::Engine(format!("{:#?}", e)))?;
        debug!(key = %key, "uploaded");
        uploaded += 1;
    }
    Ok(uploaded)
}
