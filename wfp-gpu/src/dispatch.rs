use crate::buffers::{WavefrontBuffers, WavefrontParams, FOUND_FLAG, OVERFLOW_FLAG};
use crate::context::GpuContext;
use crate::error::GpuError;
use crate::pipeline::WavefrontPipeline;
use crate::shaders::WORKGROUP_SIZE;
use crate::sync;
use log::{debug, trace};
use wfp_core::dispatch::cpu::SLOTS_PER_CELL;
use wfp_core::{DispatchArgs, DispatchError, DispatchOutcome, MazeGrid, WavefrontDispatch};

/// Runs each expansion step as one compute dispatch.
///
/// Contested cells are resolved with an atomic compare-exchange on the distance
/// field, so which slot records a cell varies between runs. Distances do not vary
/// in unit mode.
#[derive(Debug)]
pub struct GpuWavefrontDispatch {
    context: GpuContext,
    pipeline: WavefrontPipeline,
    resources: Option<(WavefrontBuffers, wgpu::BindGroup)>,
}

impl GpuWavefrontDispatch {
    pub fn new(context: GpuContext) -> Self {
        let pipeline = WavefrontPipeline::new(&context.device);
        Self {
            context,
            pipeline,
            resources: None,
        }
    }

    /// Acquires a device and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Fails when no adapter or device is available.
    pub fn new_blocking() -> Result<Self, GpuError> {
        GpuContext::new_blocking().map(Self::new)
    }

    pub const fn context(&self) -> &GpuContext {
        &self.context
    }

    fn check_limits(&self, grid: &MazeGrid, capacity: usize) -> Result<(), GpuError> {
        if u32::try_from(grid.len()).is_err() || u32::try_from(capacity).is_err() {
            return Err(GpuError::GridTooLarge(format!(
                "{}x{} grid exceeds 32-bit cell indices",
                grid.width(),
                grid.height()
            )));
        }
        let largest = (grid.len().max(capacity) * std::mem::size_of::<i32>()) as u64;
        let limit = self.context.max_storage_binding();
        if largest > limit {
            return Err(GpuError::GridTooLarge(format!(
                "buffer of {largest} bytes exceeds the device binding limit of {limit}"
            )));
        }
        Ok(())
    }
}

impl WavefrontDispatch for GpuWavefrontDispatch {
    fn name(&self) -> &str {
        "gpu"
    }

    fn prepare(&mut self, grid: &MazeGrid, capacity: usize) -> Result<(), DispatchError> {
        self.check_limits(grid, capacity)?;
        match &self.resources {
            Some((buffers, _)) if buffers.fits(grid.len(), capacity) => {
                buffers.upload_costs(&self.context.queue, grid.costs());
                trace!("Reusing GPU buffers for {} cells", grid.len());
            }
            _ => {
                let buffers = WavefrontBuffers::new(&self.context.device, grid.costs(), capacity);
                let bind_group = self.pipeline.bind_group(&self.context.device, &buffers);
                self.resources = Some((buffers, bind_group));
                debug!(
                    "Prepared GPU dispatch for {}x{} grid",
                    grid.width(),
                    grid.height()
                );
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, args: DispatchArgs<'_>) -> Result<DispatchOutcome, DispatchError> {
        args.validate()?;
        let Some((buffers, bind_group)) = &self.resources else {
            return Err(DispatchError::NotPrepared);
        };
        if buffers.cells != args.distances.len() {
            return Err(DispatchError::BufferSizeMismatch {
                name: "distances",
                expected: buffers.cells,
                actual: args.distances.len(),
            });
        }
        if buffers.capacity != args.next_frontier.len() {
            return Err(DispatchError::BufferSizeMismatch {
                name: "next_frontier",
                expected: buffers.capacity,
                actual: args.next_frontier.len(),
            });
        }
        let required = args.frontier_size * SLOTS_PER_CELL;
        if required > buffers.capacity {
            return Err(DispatchError::FrontierOverflow {
                required,
                capacity: buffers.capacity,
            });
        }

        // Sizes were checked against u32 in `prepare`.
        let params = WavefrontParams {
            width: args.width as u32,
            height: args.height as u32,
            frontier_size: args.frontier_size as u32,
            target_index: args.target_index as u32,
            capacity: buffers.capacity as u32,
            ..WavefrontParams::default()
        };
        let queue = &self.context.queue;
        let device = &self.context.device;
        buffers.upload_step(
            queue,
            &params,
            args.prev_frontier,
            args.next_frontier,
            args.distances,
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Wavefront Step Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Expand Wavefront Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(params.frontier_size.div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        buffers.encode_downloads(&mut encoder);
        queue.submit(Some(encoder.finish()));

        sync::map_all(
            device,
            &[
                &buffers.staging_next,
                &buffers.staging_distances,
                &buffers.staging_flags,
            ],
        )?;
        let next: Vec<i32> = sync::take_mapped(&buffers.staging_next);
        let distances: Vec<i32> = sync::take_mapped(&buffers.staging_distances);
        let flags: Vec<u32> = sync::take_mapped(&buffers.staging_flags);
        args.next_frontier.copy_from_slice(&next);
        args.distances.copy_from_slice(&distances);

        if flags[OVERFLOW_FLAG] != 0 {
            return Err(DispatchError::FrontierOverflow {
                required,
                capacity: buffers.capacity,
            });
        }
        let found = flags[FOUND_FLAG] != 0;
        trace!(
            "GPU dispatch expanded {} cells, found={}",
            args.frontier_size,
            found
        );
        Ok(DispatchOutcome { found })
    }
}
