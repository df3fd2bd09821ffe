use crate::error::GpuError;
use bytemuck::Pod;
use futures::channel::oneshot;
use log::{error, trace};

/// Maps every buffer for reading and blocks until the device has finished with them.
///
/// On error nothing is left mapped.
pub fn map_all(device: &wgpu::Device, buffers: &[&wgpu::Buffer]) -> Result<(), GpuError> {
    let receivers: Vec<_> = buffers
        .iter()
        .map(|buffer| {
            let (sender, receiver) = oneshot::channel();
            buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
                // The receiver only disappears if the caller already bailed out.
                let _ = sender.send(result);
            });
            receiver
        })
        .collect();

    let poll = device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| GpuError::PollFailed(e.to_string()));

    let mut failure = poll.err();
    let mut mapped = Vec::with_capacity(buffers.len());
    for (buffer, receiver) in buffers.iter().zip(receivers) {
        match pollster::block_on(receiver) {
            Ok(Ok(())) => mapped.push(*buffer),
            Ok(Err(e)) => {
                error!("Failed to map staging buffer: {:?}", e);
                failure.get_or_insert(GpuError::BufferMapFailed(e.to_string()));
            }
            Err(_) => {
                failure.get_or_insert(GpuError::BufferMapFailed(
                    "map callback was dropped".to_string(),
                ));
            }
        }
    }

    if let Some(err) = failure {
        for buffer in mapped {
            buffer.unmap();
        }
        return Err(err);
    }
    trace!("Mapped {} staging buffers", buffers.len());
    Ok(())
}

/// Copies a mapped buffer into a typed vector and unmaps it.
pub fn take_mapped<T: Pod>(buffer: &wgpu::Buffer) -> Vec<T> {
    let data = buffer.slice(..).get_mapped_range();
    let values = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    buffer.unmap();
    values
}
