//! Platforms and the devices they expose.
//!
//! Platforms sit at the root of the hierarchy. Devices come out of
//! enumeration, so the same handle is routinely seen more than once; the
//! platform wraps each device on first sight and hands back the same wrapper
//! afterwards.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::Result;
use crate::ffi::{ClDevice, ClPlatform};
use crate::object::{Lifecycle, ManagedResource};
use crate::owner::{impl_owner, Registries, ResourceOwner};
use crate::registry::HandleRegistry;
use crate::types::ResourceKind;

struct PlatformRegistries {
    devices: HandleRegistry<Device>,
}

/// A native platform.
///
/// # Example
///
/// ```
/// use clreg::{ClDevice, ClPlatform, Platform};
///
/// let platform = Platform::new(ClPlatform::from_raw(0x1000));
/// let gpu = platform.device(ClDevice::from_raw(0x2000))?;
/// let again = platform.device(ClDevice::from_raw(0x2000))?;
/// assert!(std::sync::Arc::ptr_eq(&gpu, &again));
/// # Ok::<(), clreg::Error>(())
/// ```
pub struct Platform {
    handle: ClPlatform,
    lifecycle: Lifecycle,
    registries: Registries<PlatformRegistries>,
}

impl Platform {
    /// Wrap a platform handle.
    pub fn new(handle: ClPlatform) -> Arc<Self> {
        let valid = handle.is_valid();
        Arc::new(Self {
            handle,
            lifecycle: Lifecycle::new(valid),
            registries: Registries::new(valid, || PlatformRegistries {
                devices: HandleRegistry::new(),
            }),
        })
    }

    /// The wrapper for `handle`, created on first sight.
    pub fn device(self: &Arc<Self>, handle: ClDevice) -> Result<Arc<Device>> {
        let registry = self.registry_for()?;
        registry.get_or_insert_with(handle, || Device {
            handle,
            platform: Arc::downgrade(self),
            lifecycle: Lifecycle::new(true),
        })
    }

    /// Wrap every handle from an enumeration call, reusing known wrappers.
    ///
    /// NULL entries are rejected with `InvalidHandle`.
    pub fn adopt_devices(self: &Arc<Self>, handles: &[ClDevice]) -> Result<Vec<Arc<Device>>> {
        handles.iter().map(|&h| self.device(h)).collect()
    }

    /// Look up a device that has already been seen.
    pub fn get_device(&self, handle: ClDevice) -> Result<Arc<Device>> {
        self.get_child(handle)
    }

    /// Number of devices seen so far.
    pub fn device_count(&self) -> usize {
        match self.registries.live(ResourceKind::Platform, ResourceKind::Device) {
            Ok(set) => set.devices.len(),
            Err(_) => 0,
        }
    }
}

impl ManagedResource for Platform {
    type Handle = ClPlatform;
    const KIND: ResourceKind = ResourceKind::Platform;

    fn handle(&self) -> ClPlatform {
        self.handle
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl_owner!(Platform, Device, devices);

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("handle", &self.handle)
            .field("state", &self.lifecycle.state())
            .field("devices", &self.device_count())
            .finish()
    }
}

/// A device belonging to a platform.
#[derive(Debug)]
pub struct Device {
    handle: ClDevice,
    platform: Weak<Platform>,
    lifecycle: Lifecycle,
}

impl Device {
    /// The owning platform, if it is still around.
    pub fn platform(&self) -> Option<Arc<Platform>> {
        self.platform.upgrade()
    }
}

impl ManagedResource for Device {
    type Handle = ClDevice;
    const KIND: ResourceKind = ResourceKind::Device;

    fn handle(&self) -> ClDevice {
        self.handle
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl From<&Device> for ClDevice {
    fn from(device: &Device) -> ClDevice {
        device.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LifecycleState;

    #[test]
    fn test_devices_are_wrapped_once() {
        let platform = Platform::new(ClPlatform::from_raw(0x1));
        let devices = platform
            .adopt_devices(&[ClDevice::from_raw(0x10), ClDevice::from_raw(0x11), ClDevice::from_raw(0x10)])
            .unwrap();
        assert_eq!(platform.device_count(), 2);
        assert!(Arc::ptr_eq(&devices[0], &devices[2]));
        assert!(Arc::ptr_eq(&devices[1], &platform.get_device(ClDevice::from_raw(0x11)).unwrap()));
        assert!(Arc::ptr_eq(&devices[0].platform().unwrap(), &platform));
    }

    #[test]
    fn test_unknown_device_is_not_found() {
        let platform = Platform::new(ClPlatform::from_raw(0x2));
        assert!(platform.get_device(ClDevice::from_raw(0x99)).unwrap_err().is_child_not_found());
    }

    #[test]
    fn test_null_platform_owns_nothing() {
        let platform = Platform::new(ClPlatform::invalid());
        assert_eq!(platform.state(), LifecycleState::Uninitialized);
        assert!(platform.device(ClDevice::from_raw(0x10)).unwrap_err().is_invalid_owner());
        assert!(platform.get_device(ClDevice::from_raw(0x10)).unwrap_err().is_invalid_owner());
        assert_eq!(platform.device_count(), 0);
    }

    #[test]
    fn test_dropping_platform_invalidates_devices() {
        let platform = Platform::new(ClPlatform::from_raw(0x3));
        let device = platform.device(ClDevice::from_raw(0x30)).unwrap();
        drop(platform);
        assert!(device.platform().is_none());
        assert_eq!(device.state(), LifecycleState::Invalidated);
    }
}
