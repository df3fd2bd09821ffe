use bytemuck::{Pod, Zeroable};
use log::debug;
use std::mem::size_of;
use wgpu::util::DeviceExt;

/// Uniform block matching `Params` in the kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WavefrontParams {
    pub width: u32,
    pub height: u32,
    pub frontier_size: u32,
    pub target_index: u32,
    pub capacity: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

/// Index of the found flag in the flags buffer.
pub const FOUND_FLAG: usize = 0;
/// Index of the overflow flag in the flags buffer.
pub const OVERFLOW_FLAG: usize = 1;
const FLAG_COUNT: usize = 2;

fn byte_len<T>(len: usize) -> u64 {
    (len * size_of::<T>()) as u64
}

/// Device-side storage for one grid.
///
/// `costs` is written once per run; the frontier and distance buffers are uploaded
/// before and read back after every dispatch.
#[derive(Debug)]
pub struct WavefrontBuffers {
    pub params: wgpu::Buffer,
    pub costs: wgpu::Buffer,
    pub prev_frontier: wgpu::Buffer,
    pub next_frontier: wgpu::Buffer,
    pub distances: wgpu::Buffer,
    pub flags: wgpu::Buffer,
    pub staging_next: wgpu::Buffer,
    pub staging_distances: wgpu::Buffer,
    pub staging_flags: wgpu::Buffer,
    pub cells: usize,
    pub capacity: usize,
}

impl WavefrontBuffers {
    pub fn new(device: &wgpu::Device, costs: &[i32], capacity: usize) -> Self {
        let cells = costs.len();
        let storage = |label: &str, size: u64, extra: wgpu::BufferUsages| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | extra,
                mapped_at_creation: false,
            })
        };
        let staging = |label: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Params Uniform"),
            size: size_of::<WavefrontParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let costs_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Costs"),
            contents: bytemuck::cast_slice(costs),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        let frontier_bytes = byte_len::<i32>(capacity);
        let distance_bytes = byte_len::<i32>(cells);
        let flag_bytes = byte_len::<u32>(FLAG_COUNT);

        debug!(
            "Allocated wavefront buffers: {} cells, {} frontier slots",
            cells, capacity
        );
        Self {
            params,
            costs: costs_buf,
            prev_frontier: storage("Prev Frontier", frontier_bytes, wgpu::BufferUsages::empty()),
            next_frontier: storage("Next Frontier", frontier_bytes, wgpu::BufferUsages::COPY_SRC),
            distances: storage("Distances", distance_bytes, wgpu::BufferUsages::COPY_SRC),
            flags: storage("Flags", flag_bytes, wgpu::BufferUsages::COPY_SRC),
            staging_next: staging("Staging Next Frontier", frontier_bytes),
            staging_distances: staging("Staging Distances", distance_bytes),
            staging_flags: staging("Staging Flags", flag_bytes),
            cells,
            capacity,
        }
    }

    /// True when these buffers can serve a grid of `cells` with `capacity` slots.
    pub const fn fits(&self, cells: usize, capacity: usize) -> bool {
        self.cells == cells && self.capacity == capacity
    }

    pub fn upload_costs(&self, queue: &wgpu::Queue, costs: &[i32]) {
        queue.write_buffer(&self.costs, 0, bytemuck::cast_slice(costs));
    }

    /// Writes the host state for one dispatch and clears both flags.
    pub fn upload_step(
        &self,
        queue: &wgpu::Queue,
        params: &WavefrontParams,
        prev_frontier: &[i32],
        next_frontier: &[i32],
        distances: &[i32],
    ) {
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(params));
        queue.write_buffer(&self.prev_frontier, 0, bytemuck::cast_slice(prev_frontier));
        queue.write_buffer(&self.next_frontier, 0, bytemuck::cast_slice(next_frontier));
        queue.write_buffer(&self.distances, 0, bytemuck::cast_slice(distances));
        queue.write_buffer(&self.flags, 0, bytemuck::cast_slice(&[0u32; FLAG_COUNT]));
    }

    /// Copies the dispatch outputs into the staging buffers.
    pub fn encode_downloads(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(
            &self.next_frontier,
            0,
            &self.staging_next,
            0,
            self.next_frontier.size(),
        );
        encoder.copy_buffer_to_buffer(
            &self.distances,
            0,
            &self.staging_distances,
            0,
            self.distances.size(),
        );
        encoder.copy_buffer_to_buffer(&self.flags, 0, &self.staging_flags, 0, self.flags.size());
    }
}
