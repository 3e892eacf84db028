//! Byte transports to a printer.
//!
//! A [`Transport`] moves a finished instruction stream to the device and
//! hands back whatever the device answered. USB is behind the `usb`
//! feature; [`StreamTransport`] covers anything that is `Read + Write`,
//! such as a `TcpStream` to port 9100 of a networked printer.

use std::{
    io::{ErrorKind, Read, Write},
    time::Duration,
};

use log::debug;

use crate::{error::Error, status::STATUS_LEN};

pub trait Transport {
    /// Send `data` as one unit.
    fn send(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Read one response, waiting at most `timeout`. An empty buffer means
    /// nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, data: &[u8]) -> Result<(), Error> {
        (**self).send(data)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, Error> {
        (**self).receive(timeout)
    }
}

/// Transport over a byte stream.
///
/// The read timeout has to be configured on the stream itself; `receive`
/// treats a timed out read as no response.
pub struct StreamTransport<S> {
    stream: S,
}

impl<S: Read + Write> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        StreamTransport { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn send(&mut self, data: &[u8]) -> Result<(), Error> {
        self.stream.write_all(data)?;
        self.stream.flush()?;
        debug!("Sent {} bytes", data.len());
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<Vec<u8>, Error> {
        let mut buf = [0x00; STATUS_LEN];
        match self.stream.read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(Vec::new())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(feature = "usb")]
pub use usb::UsbTransport;

#[cfg(feature = "usb")]
mod usb {
    use std::time::Duration;

    use log::{debug, info};
    use rusb::{
        Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext,
    };

    use super::Transport;
    use crate::{error::Error, model::ModelProfile, status::STATUS_LEN};

    /// Brother Industries
    pub const VENDOR_ID: u16 = 0x04F9;

    #[derive(Debug, Clone, Copy)]
    struct Endpoint {
        address: u8,
    }

    /// A printer attached over USB, found by product id and serial number.
    pub struct UsbTransport {
        handle: DeviceHandle<Context>,
        endpoint_out: Endpoint,
        endpoint_in: Endpoint,
        write_timeout: Duration,
    }

    impl UsbTransport {
        pub fn open(model: &ModelProfile, serial: &str) -> Result<Self, Error> {
            let mut context = Context::new()?;
            let (mut device, device_desc, mut handle) =
                match Self::open_device(&mut context, VENDOR_ID, model.product_id, serial) {
                    Ok(found) => found,
                    Err(err) => {
                        debug!("{:?}", err);
                        return Err(Error::DeviceOffline);
                    }
                };
            handle.reset()?;

            let endpoint_in =
                Self::find_endpoint(&mut device, &device_desc, Direction::In, TransferType::Bulk)
                    .ok_or(Error::MissingEndpoint)?;
            let endpoint_out =
                Self::find_endpoint(&mut device, &device_desc, Direction::Out, TransferType::Bulk)
                    .ok_or(Error::MissingEndpoint)?;

            // The QL-800 comes up bound to the usblp kernel driver, the
            // QL-820NWB does not.
            handle.set_auto_detach_kernel_driver(true)?;
            let has_kernel_driver = matches!(handle.kernel_driver_active(0), Ok(true));
            info!("Kernel driver support is {}", has_kernel_driver);
            handle.set_active_configuration(1)?;
            handle.claim_interface(0)?;
            handle.set_alternate_setting(0, 0)?;

            Ok(UsbTransport {
                handle,
                endpoint_out,
                endpoint_in,
                write_timeout: Duration::from_secs(10),
            })
        }

        fn open_device(
            context: &mut Context,
            vid: u16,
            pid: u16,
            serial: &str,
        ) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>), Error> {
            let devices = context.devices()?;

            for device in devices.iter() {
                let device_desc = match device.device_descriptor() {
                    Ok(d) => d,
                    Err(err) => {
                        debug!("{:?}", err);
                        continue;
                    }
                };
                if device_desc.vendor_id() != vid || device_desc.product_id() != pid {
                    continue;
                }

                let handle = match device.open() {
                    Ok(handle) => handle,
                    Err(err) => {
                        debug!("Failed to open device: {:?}", err);
                        continue;
                    }
                };
                let timeout = Duration::from_secs(1);
                let language = match handle.read_languages(timeout)?.first() {
                    Some(language) => *language,
                    None => continue,
                };
                match handle.read_serial_number_string(language, &device_desc, timeout) {
                    Ok(s) if s == serial => return Ok((device, device_desc, handle)),
                    Ok(_) => continue,
                    Err(err) => {
                        debug!("Failed to read serial number string: {:?}", err);
                        continue;
                    }
                }
            }
            debug!("No device match with this serial: {:?}", serial);
            Err(Error::DeviceOffline)
        }

        fn find_endpoint(
            device: &mut Device<Context>,
            device_desc: &DeviceDescriptor,
            direction: Direction,
            transfer_type: TransferType,
        ) -> Option<Endpoint> {
            for n in 0..device_desc.num_configurations() {
                let config_desc = match device.config_descriptor(n) {
                    Ok(c) => c,
                    Err(_) => continue,
                };
                for interface in config_desc.interfaces() {
                    for interface_desc in interface.descriptors() {
                        for endpoint_desc in interface_desc.endpoint_descriptors() {
                            if endpoint_desc.direction() == direction
                                && endpoint_desc.transfer_type() == transfer_type
                            {
                                return Some(Endpoint {
                                    address: endpoint_desc.address(),
                                });
                            }
                        }
                    }
                }
            }
            None
        }
    }

    impl Transport for UsbTransport {
        fn send(&mut self, data: &[u8]) -> Result<(), Error> {
            let n = self
                .handle
                .write_bulk(self.endpoint_out.address, data, self.write_timeout)?;
            if n != data.len() {
                return Err(Error::ShortWrite {
                    written: n,
                    expected: data.len(),
                });
            }
            debug!("Sent {} bytes", n);
            Ok(())
        }

        fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, Error> {
            let mut buf = [0x00; STATUS_LEN];
            match self.handle.read_bulk(self.endpoint_in.address, &mut buf, timeout) {
                Ok(n) => Ok(buf[..n].to_vec()),
                Err(rusb::Error::Timeout) => Ok(Vec::new()),
                Err(e) => Err(Error::Usb(e)),
            }
        }
    }
}
