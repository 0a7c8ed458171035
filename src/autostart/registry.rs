//! HKCU Run key storage

use crate::autostart::AutostartStore;
use crate::error::{LauncherError, Result};
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, WIN32_ERROR};
use windows::Win32::System::Registry::{
    RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
    HKEY_CURRENT_USER, KEY_READ, KEY_SET_VALUE, REG_SAM_FLAGS, REG_SZ, REG_VALUE_TYPE,
};

const RUN_KEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Run";

/// `HKCU\Software\Microsoft\Windows\CurrentVersion\Run`
#[derive(Debug, Default, Clone, Copy)]
pub struct RunKeyStore;

/// Open registry key, closed on drop
struct RunKey(HKEY);

impl RunKey {
    fn open(access: REG_SAM_FLAGS) -> Result<Self> {
        let mut handle = HKEY::default();
        let subkey = HSTRING::from(RUN_KEY);
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                0,
                access,
                &mut handle,
            )
        };
        check(status, "open Run key")?;
        Ok(Self(handle))
    }
}

impl Drop for RunKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

fn check(status: WIN32_ERROR, action: &str) -> Result<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(LauncherError::RegistryAccess(format!(
            "{} failed (error {})",
            action, status.0
        )))
    }
}

impl AutostartStore for RunKeyStore {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let key = RunKey::open(KEY_READ)?;
        let value_name = HSTRING::from(name);

        // First call sizes the buffer
        let mut kind = REG_VALUE_TYPE::default();
        let mut size: u32 = 0;
        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR(value_name.as_ptr()),
                None,
                Some(&mut kind),
                None,
                Some(&mut size),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, "query autostart value")?;

        let mut buffer = vec![0u16; (size as usize).div_ceil(2)];
        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR(value_name.as_ptr()),
                None,
                Some(&mut kind),
                Some(buffer.as_mut_ptr() as *mut u8),
                Some(&mut size),
            )
        };
        check(status, "read autostart value")?;

        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Ok(Some(String::from_utf16_lossy(&buffer[..len])))
    }

    fn write(&self, name: &str, command: &str) -> Result<()> {
        let key = RunKey::open(KEY_SET_VALUE)?;
        let value_name = HSTRING::from(name);

        let wide: Vec<u16> = command.encode_utf16().chain(std::iter::once(0)).collect();
        let bytes =
            unsafe { std::slice::from_raw_parts(wide.as_ptr() as *const u8, wide.len() * 2) };

        let status =
            unsafe { RegSetValueExW(key.0, PCWSTR(value_name.as_ptr()), 0, REG_SZ, Some(bytes)) };
        check(status, "write autostart value")
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let key = RunKey::open(KEY_SET_VALUE)?;
        let value_name = HSTRING::from(name);

        let status = unsafe { RegDeleteValueW(key.0, PCWSTR(value_name.as_ptr())) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(false);
        }
        check(status, "delete autostart value")?;
        Ok(true)
    }
}
