use std::sync::Arc;

use thiserror::Error;
use wgpu::{self};

use crate::clustering::domain::paired_distance::{pair_count, ClusterPoint};

const WORKGROUP_SIZE: u32 = 16;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("{faces} faces need a {bytes}-byte pair buffer, device limit is {limit}")]
    BufferTooLarge { faces: usize, bytes: u64, limit: u64 },
    #[error("{faces} faces exceed the dispatch grid limit")]
    DispatchTooLarge { faces: usize },
    #[error("failed to map pair buffer: {0}")]
    MapFailed(#[from] wgpu::BufferAsyncError),
    #[error("map callback dropped before completing")]
    ChannelClosed,
}

/// Shared GPU context for the pairing kernel.
///
/// Holds the wgpu device, queue, and compiled pipeline so repeated
/// clustering runs skip shader compilation.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub pipeline: wgpu::ComputePipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    max_storage_bytes: u64,
    max_workgroups: u32,
}

/// Packed params matching the WGSL uniform layout (16 bytes).
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuPairParams {
    pub count: u32,
    pub threshold_sq: f32,
    pub _pad0: u32,
    pub _pad1: u32,
}

/// One face as the kernel reads it (16 bytes, `vec2<f32>` aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuFacePoint {
    pub pos: [f32; 2],
    pub disabled: u32,
    pub _pad: u32,
}

impl From<&ClusterPoint> for GpuFacePoint {
    fn from(point: &ClusterPoint) -> Self {
        Self {
            pos: point.coords_f32(),
            disabled: u32::from(point.disabled),
            _pad: 0,
        }
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl GpuContext {
    /// Create a new GPU context. Returns `None` if no suitable adapter is available.
    pub fn new() -> Option<Self> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cluster-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .ok()?;

        let limits = device.limits();
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pair-distance-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pair_distance.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pair-bind-group-layout"),
            entries: &[
                // params uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // face positions (read)
                storage_entry(1, true),
                // paired flags (read-write)
                storage_entry(2, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pair-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("pair-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Some(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            max_storage_bytes: u64::from(limits.max_storage_buffer_binding_size),
            max_workgroups: limits.max_compute_workgroups_per_dimension,
        })
    }

    /// Runs the pairing kernel. Returns one flag per unordered pair in
    /// row-major upper-triangle order (see `pair_slot`).
    pub fn pair_flags(&self, points: &[ClusterPoint], threshold_sq: f32) -> Result<Vec<u32>, GpuError> {
        let n = points.len();
        let pairs = pair_count(n);
        if pairs == 0 {
            return Ok(Vec::new());
        }

        let out_size = (pairs * std::mem::size_of::<u32>()) as u64;
        if out_size > self.max_storage_bytes {
            return Err(GpuError::BufferTooLarge {
                faces: n,
                bytes: out_size,
                limit: self.max_storage_bytes,
            });
        }
        let Ok(count) = u32::try_from(n) else {
            return Err(GpuError::DispatchTooLarge { faces: n });
        };
        let groups = count.div_ceil(WORKGROUP_SIZE);
        if groups > self.max_workgroups {
            return Err(GpuError::DispatchTooLarge { faces: n });
        }

        let faces: Vec<GpuFacePoint> = points.iter().map(GpuFacePoint::from).collect();
        let faces_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("faces"),
            size: std::mem::size_of_val(faces.as_slice()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let output_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("paired"),
            size: out_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size: out_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = GpuPairParams {
            count,
            threshold_sq,
            _pad0: 0,
            _pad1: 0,
        };
        let params_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("params"),
            size: std::mem::size_of::<GpuPairParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.queue
            .write_buffer(&faces_buf, 0, bytemuck::cast_slice(&faces));
        self.queue
            .write_buffer(&params_buf, 0, bytemuck::bytes_of(&params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pair-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: faces_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("enc-pairs"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("pairs"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups, groups, 1);
        }
        encoder.copy_buffer_to_buffer(&output_buf, 0, &staging_buf, 0, out_size);
        self.queue.submit(Some(encoder.finish()));

        // Read back results
        let slice = staging_buf.slice(..);
        let (tx, rx) = crossbeam_channel::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| GpuError::ChannelClosed)??;

        let mapped = slice.get_mapped_range();
        let flags: Vec<u32> = bytemuck::cast_slice(&mapped).to_vec();
        drop(mapped);
        staging_buf.unmap();

        Ok(flags)
    }
}
