//! Windows Service Control Manager backend

use crate::error::{LauncherError, Result};
use crate::service::{ServiceControl, ServiceState};
use std::ffi::OsStr;
use windows_service::service::{Service, ServiceAccess, ServiceState as ScmState};
use windows_service::service_manager::{ServiceManager, ServiceManagerAccess};

/// ERROR_SERVICE_DOES_NOT_EXIST
const SERVICE_DOES_NOT_EXIST: i32 = 1060;

/// Controls services through the local Service Control Manager
#[derive(Debug, Default, Clone, Copy)]
pub struct ScmControl;

impl ScmControl {
    fn open(name: &str, access: ServiceAccess) -> windows_service::Result<Service> {
        let manager = ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CONNECT)?;
        manager.open_service(name, access)
    }

    fn is_missing(error: &windows_service::Error) -> bool {
        matches!(
            error,
            windows_service::Error::Winapi(io) if io.raw_os_error() == Some(SERVICE_DOES_NOT_EXIST)
        )
    }
}

impl ServiceControl for ScmControl {
    fn query(&self, name: &str) -> Result<ServiceState> {
        let service = match Self::open(name, ServiceAccess::QUERY_STATUS) {
            Ok(service) => service,
            Err(e) if Self::is_missing(&e) => return Ok(ServiceState::NotPresent),
            Err(e) => return Err(LauncherError::service(name, e.to_string())),
        };

        let status = service
            .query_status()
            .map_err(|e| LauncherError::service(name, e.to_string()))?;

        Ok(match status.current_state {
            ScmState::Running => ServiceState::Running,
            ScmState::Stopped | ScmState::Paused => ServiceState::Stopped,
            ScmState::StartPending
            | ScmState::StopPending
            | ScmState::ContinuePending
            | ScmState::PausePending => ServiceState::Transitioning,
        })
    }

    fn start(&self, name: &str) -> Result<()> {
        let service = Self::open(name, ServiceAccess::START)
            .map_err(|e| LauncherError::service(name, e.to_string()))?;
        service
            .start(&[] as &[&OsStr])
            .map_err(|e| LauncherError::service(name, e.to_string()))
    }

    fn stop(&self, name: &str) -> Result<()> {
        let service = Self::open(name, ServiceAccess::STOP)
            .map_err(|e| LauncherError::service(name, e.to_string()))?;
        service
            .stop()
            .map(|_| ())
            .map_err(|e| LauncherError::service(name, e.to_string()))
    }
}
