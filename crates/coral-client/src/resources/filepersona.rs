//! File-persona management (SSH, mostly with projection)
//!
//! The file-persona surface is not exposed through the WSAPI; every
//! operation here goes over the CLI. Queries are projected into the unified
//! result shape, mutations return the CLI's raw lines.

use coral_core::ClientError;
use coral_protocol::CommandResult;

use crate::client::CoralClient;
use crate::ssh::OptValue;

impl CoralClient {
    /// File-services node status
    pub async fn get_file_services(&self) -> Result<CommandResult, ClientError> {
        self.ssh_run_and_project("getfs", &[], &[]).await
    }

    /// List file-provisioning groups, optionally one by name
    pub async fn get_fpgs(&self, fpg: Option<&str>) -> Result<CommandResult, ClientError> {
        let args: Vec<&str> = fpg.into_iter().collect();
        self.ssh_run_and_project("getfpg", &args, &[]).await
    }

    /// Create a file-provisioning group on a CPG
    pub async fn create_fpg(
        &self,
        cpg: &str,
        name: &str,
        size: &str,
        comment: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run(
            "createfpg",
            &[cpg, name, size],
            &[("comment", comment.into())],
        )
        .await
    }

    /// Remove a file-provisioning group
    pub async fn remove_fpg(&self, name: &str) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run("removefpg", &[name], &[]).await
    }

    /// List virtual file servers, optionally scoped to an FPG
    pub async fn get_vfs(&self, fpg: Option<&str>) -> Result<CommandResult, ClientError> {
        self.ssh_run_and_project("getvfs", &[], &[("fpg", fpg.into())])
            .await
    }

    /// Create a virtual file server
    pub async fn create_vfs(
        &self,
        ip: &str,
        subnet: &str,
        name: &str,
        fpg: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run(
            "createvfs",
            &[ip, subnet, name],
            &[("fpg", fpg.into()), ("comment", comment.into())],
        )
        .await
    }

    /// Remove a virtual file server
    pub async fn remove_vfs(
        &self,
        name: &str,
        fpg: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run("removevfs", &[name], &[("fpg", fpg.into())])
            .await
    }

    /// List file stores
    pub async fn get_file_stores(
        &self,
        vfs: Option<&str>,
        fpg: Option<&str>,
    ) -> Result<CommandResult, ClientError> {
        self.ssh_run_and_project(
            "getfstore",
            &[],
            &[("vfs", vfs.into()), ("fpg", fpg.into())],
        )
        .await
    }

    /// Create a file store under a virtual file server
    pub async fn create_file_store(
        &self,
        vfs: &str,
        name: &str,
        comment: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run("createfstore", &[vfs, name], &[("comment", comment.into())])
            .await
    }

    /// Remove a file store
    pub async fn remove_file_store(&self, vfs: &str, name: &str) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run("removefstore", &[vfs, name], &[]).await
    }

    /// List file shares for a protocol
    pub async fn get_file_shares(
        &self,
        protocol: &str,
        vfs: Option<&str>,
    ) -> Result<CommandResult, ClientError> {
        self.ssh_run_and_project("getfshare", &[protocol], &[("vfs", vfs.into())])
            .await
    }

    /// Create a file share
    pub async fn create_file_share(
        &self,
        protocol: &str,
        vfs: &str,
        share_name: &str,
        fstore: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run(
            "createfshare",
            &[protocol, vfs, share_name],
            &[("fstore", fstore.into()), ("comment", comment.into())],
        )
        .await
    }

    /// Remove a file share
    pub async fn remove_file_share(
        &self,
        protocol: &str,
        vfs: &str,
        share_name: &str,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run("removefshare", &[protocol, vfs, share_name], &[])
            .await
    }

    /// List file-store snapshots
    pub async fn get_file_snapshots(
        &self,
        vfs: Option<&str>,
        fstore: Option<&str>,
    ) -> Result<CommandResult, ClientError> {
        self.ssh_run_and_project(
            "getfsnap",
            &[],
            &[("vfs", vfs.into()), ("fstore", fstore.into())],
        )
        .await
    }

    /// Snapshot a file store
    pub async fn create_file_snapshot(
        &self,
        vfs: &str,
        fstore: &str,
        tag: &str,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run("createfsnap", &[vfs, fstore, tag], &[])
            .await
    }

    /// Remove a file-store snapshot
    pub async fn remove_file_snapshot(
        &self,
        vfs: &str,
        fstore: &str,
        snapshot: &str,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run("removefsnap", &[vfs, fstore, snapshot], &[])
            .await
    }

    /// List quotas; this command wraps its rows in an extra list level which
    /// the dispatcher unwraps before projection
    pub async fn get_quotas(&self, fpg: Option<&str>) -> Result<CommandResult, ClientError> {
        self.ssh_run_and_project("getfsquota", &[], &[("fpg", fpg.into())])
            .await
    }

    /// Set a quota on a file store
    pub async fn set_quota(
        &self,
        vfs: &str,
        fstore: &str,
        scapacity: Option<&str>,
        hcapacity: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        self.ssh_build_and_run(
            "setfsquota",
            &[vfs, fstore],
            &[
                ("scapacity", scapacity.into()),
                ("hcapacity", hcapacity.into()),
            ],
        )
        .await
    }
}
