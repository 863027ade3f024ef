//! Cloud storage backends over opendal.
//!
//! Each settings loader validates the adapter's settings up front and hands
//! back a constructor; the constructed folder owns a small tokio runtime and
//! drives the async operator through it, so callers stay synchronous.

use crate::config::result_error::error::Error;
use crate::config::result_error::result::Result;
use crate::config::settings::Settings;
use crate::config::storage::{split_prefix, Folder, FolderBuilder};
use futures::TryStreamExt;
use opendal::{services, Operator};
use std::sync::Arc;

pub const S3_REGION_SETTING: &str = "WALVAULT_S3_REGION";
pub const S3_ENDPOINT_SETTING: &str = "AWS_ENDPOINT";
pub const S3_ACCESS_KEY_ID_SETTING: &str = "AWS_ACCESS_KEY_ID";
pub const S3_SECRET_ACCESS_KEY_SETTING: &str = "AWS_SECRET_ACCESS_KEY";
pub const GCS_CREDENTIAL_PATH_SETTING: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const AZURE_ACCOUNT_SETTING: &str = "AZURE_STORAGE_ACCOUNT";
pub const AZURE_ACCESS_KEY_SETTING: &str = "AZURE_STORAGE_ACCESS_KEY";
pub const AZURE_ENDPOINT_SETTING: &str = "AZURE_STORAGE_ENDPOINT";

#[derive(Debug)]
struct RemoteFolder {
    scheme: &'static str,
    op: Operator,
    runtime: tokio::runtime::Runtime,
}

impl RemoteFolder {
    fn create(scheme: &'static str, op: Operator) -> Result<Arc<dyn Folder>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        Ok(Arc::new(Self {
            scheme,
            op,
            runtime,
        }))
    }
}

impl Folder for RemoteFolder {
    fn scheme(&self) -> &'static str {
        self.scheme
    }

    fn put_object(&self, name: &str, content: &[u8]) -> Result<()> {
        self.runtime.block_on(self.op.write(name, content.to_vec()))?;
        Ok(())
    }

    fn get_object(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.runtime.block_on(self.op.read(name))?)
    }

    fn list_objects(&self) -> Result<Vec<String>> {
        let entries: Vec<opendal::Entry> = self.runtime.block_on(async {
            let lister = self.op.lister("/").await?;
            lister.try_collect().await
        })?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.path().ends_with('/'))
            .map(|entry| entry.name().to_string())
            .collect())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.runtime.block_on(self.op.is_exist(name))?)
    }
}

#[derive(Clone, Debug)]
struct S3Settings {
    region: String,
    endpoint: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
}

pub(crate) fn load_s3_settings(settings: &dyn Settings) -> Result<FolderBuilder> {
    let region = settings
        .lookup(S3_REGION_SETTING)
        .or_else(|| settings.lookup("AWS_REGION"))
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingAdapterSetting {
            scheme: "s3",
            setting: S3_REGION_SETTING,
        })?;
    let s3 = S3Settings {
        region,
        endpoint: settings.lookup(S3_ENDPOINT_SETTING),
        access_key_id: settings.lookup(S3_ACCESS_KEY_ID_SETTING),
        secret_access_key: settings.lookup(S3_SECRET_ACCESS_KEY_SETTING),
    };
    Ok(Box::new(move |prefix| {
        let (bucket, root) = split_prefix("s3", prefix)?;
        let mut builder = services::S3::default();
        builder.bucket(&bucket);
        builder.region(&s3.region);
        if !root.is_empty() {
            builder.root(&format!("/{root}"));
        }
        if let Some(endpoint) = &s3.endpoint {
            builder.endpoint(endpoint);
        }
        if let Some(key) = &s3.access_key_id {
            builder.access_key_id(key);
        }
        if let Some(secret) = &s3.secret_access_key {
            builder.secret_access_key(secret);
        }
        RemoteFolder::create("s3", Operator::new(builder)?.finish())
    }))
}

pub(crate) fn load_gcs_settings(settings: &dyn Settings) -> Result<FolderBuilder> {
    let credential_path = settings.lookup(GCS_CREDENTIAL_PATH_SETTING);
    Ok(Box::new(move |prefix| {
        let (bucket, root) = split_prefix("gcs", prefix)?;
        let mut builder = services::Gcs::default();
        builder.bucket(&bucket);
        if !root.is_empty() {
            builder.root(&format!("/{root}"));
        }
        if let Some(path) = &credential_path {
            builder.credential_path(path);
        }
        RemoteFolder::create("gcs", Operator::new(builder)?.finish())
    }))
}

#[derive(Clone, Debug)]
struct AzureSettings {
    account_name: String,
    account_key: String,
    endpoint: String,
}

pub(crate) fn load_azure_settings(settings: &dyn Settings) -> Result<FolderBuilder> {
    let account_name = settings
        .lookup(AZURE_ACCOUNT_SETTING)
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingAdapterSetting {
            scheme: "azure",
            setting: AZURE_ACCOUNT_SETTING,
        })?;
    let account_key = settings
        .lookup(AZURE_ACCESS_KEY_SETTING)
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingAdapterSetting {
            scheme: "azure",
            setting: AZURE_ACCESS_KEY_SETTING,
        })?;
    let endpoint = settings
        .lookup(AZURE_ENDPOINT_SETTING)
        .unwrap_or_else(|| format!("https://{account_name}.blob.core.windows.net"));
    let azure = AzureSettings {
        account_name,
        account_key,
        endpoint,
    };
    Ok(Box::new(move |prefix| {
        let (container, root) = split_prefix("azure", prefix)?;
        let mut builder = services::Azblob::default();
        builder.container(&container);
        if !root.is_empty() {
            builder.root(&format!("/{root}"));
        }
        builder.endpoint(&azure.endpoint);
        builder.account_name(&azure.account_name);
        builder.account_key(&azure.account_key);
        RemoteFolder::create("azure", Operator::new(builder)?.finish())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::MapSettings;

    #[test]
    fn test_s3_settings_require_region() {
        let error = load_s3_settings(&MapSettings::new()).err().unwrap();
        match error {
            Error::MissingAdapterSetting { scheme, setting } => {
                assert_eq!(scheme, "s3");
                assert_eq!(setting, S3_REGION_SETTING);
            }
            _ => panic!("Expected MissingAdapterSetting error"),
        }
    }

    #[test]
    fn test_s3_folder_construction() {
        let settings = MapSettings::new()
            .set(S3_REGION_SETTING, "us-east-1")
            .set(S3_ACCESS_KEY_ID_SETTING, "AKIAEXAMPLE")
            .set(S3_SECRET_ACCESS_KEY_SETTING, "secretsecret");
        let build = load_s3_settings(&settings).unwrap();
        let folder = build("s3://bucket/backups").unwrap();
        assert_eq!(folder.scheme(), "s3");
    }

    #[test]
    fn test_azure_settings_require_account_and_key() {
        let settings = MapSettings::new().set(AZURE_ACCOUNT_SETTING, "account");
        let error = load_azure_settings(&settings).err().unwrap();
        match error {
            Error::MissingAdapterSetting { setting, .. } => {
                assert_eq!(setting, AZURE_ACCESS_KEY_SETTING)
            }
            _ => panic!("Expected MissingAdapterSetting error"),
        }
    }

    #[test]
    fn test_remote_folder_object_cycle() {
        let builder = services::Memory::default();
        let op = Operator::new(builder).unwrap().finish();
        let folder = RemoteFolder::create("s3", op).unwrap();

        folder.put_object("000000010000000000000001.lz4", b"segment").unwrap();
        folder.put_object("base_backup.tar.lz4", b"base").unwrap();

        assert!(folder.exists("base_backup.tar.lz4").unwrap());
        assert!(!folder.exists("missing").unwrap());
        assert_eq!(
            folder.get_object("000000010000000000000001.lz4").unwrap(),
            b"segment"
        );
        let mut names = folder.list_objects().unwrap();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "000000010000000000000001.lz4".to_string(),
                "base_backup.tar.lz4".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        let settings = MapSettings::new().set(S3_REGION_SETTING, "us-east-1");
        let build = load_s3_settings(&settings).unwrap();
        let error = build("not-a-prefix").unwrap_err();
        match error {
            Error::InvalidPrefix { scheme, .. } => assert_eq!(scheme, "s3"),
            _ => panic!("Expected InvalidPrefix error"),
        }
    }
}
