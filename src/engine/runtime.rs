//! OpenVINO runtime wrapper
//!
//! Compiles a network once and hands out inference requests to callers on
//! the blocking thread pool.

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, ensure, Context, Result};
use openvino::{CompiledModel, Core, ElementType, Shape, Tensor};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Wrapper for OpenVINO Core that implements Send + Sync.
/// Never touched again after compilation.
struct SafeCore(Core);
unsafe impl Send for SafeCore {}
unsafe impl Sync for SafeCore {}

/// Wrapper for OpenVINO CompiledModel that can move between threads.
/// Access is serialized by the owning mutex.
struct SafeCompiledModel(CompiledModel);
unsafe impl Send for SafeCompiledModel {}

/// A network compiled for one device
pub struct CompiledNetwork {
    // Keeps the runtime alive for as long as the compiled model
    _core: SafeCore,
    compiled: Mutex<SafeCompiledModel>,
    device: String,
}

impl CompiledNetwork {
    /// Read and compile a model (ONNX or OpenVINO IR)
    pub fn load(path: &Path, device: &str) -> Result<Self> {
        if !path.is_file() {
            bail!("model file not found: {}", path.display());
        }
        let path_str = path
            .to_str()
            .with_context(|| format!("model path is not valid UTF-8: {}", path.display()))?;

        info!("Compiling network {} for {}", path_str, device);
        let start = Instant::now();

        let mut core = Core::new()?;
        let model = core
            .read_model_from_file(path_str, "")
            .with_context(|| format!("Failed to read model {}", path_str))?;
        let compiled = core
            .compile_model(&model, device.into())
            .with_context(|| format!("Failed to compile model for device {}", device))?;

        info!("Network compiled in {:?}", start.elapsed());

        Ok(Self {
            _core: SafeCore(core),
            compiled: Mutex::new(SafeCompiledModel(compiled)),
            device: device.to_string(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Run one forward pass on a contiguous f32 input and return the first output
    pub fn infer(&self, input: &[f32], dims: &[i64]) -> Result<Vec<f32>> {
        let expected: i64 = dims.iter().product();
        ensure!(
            expected as usize == input.len(),
            "input has {} values but shape {:?} needs {}",
            input.len(),
            dims,
            expected
        );

        let mut request = {
            let mut compiled = self.compiled.lock();
            compiled.0.create_infer_request()?
        };

        let shape = Shape::new(dims)?;
        let mut tensor = Tensor::new(ElementType::F32, &shape)?;
        write_f32(tensor.get_raw_data_mut()?, input)?;

        request.set_input_tensor(&tensor)?;
        request.infer()?;

        let output = request.get_output_tensor()?;
        let output_shape = output.get_shape()?;
        debug!("Network output shape: {:?}", output_shape.get_dimensions());

        read_f32(output.get_raw_data()?)
    }
}

fn write_f32(dst: &mut [u8], values: &[f32]) -> Result<()> {
    ensure!(
        dst.len() == values.len() * 4,
        "tensor buffer holds {} bytes, input needs {}",
        dst.len(),
        values.len() * 4
    );
    for (chunk, v) in dst.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&v.to_ne_bytes());
    }
    Ok(())
}

fn read_f32(src: &[u8]) -> Result<Vec<f32>> {
    ensure!(src.len() % 4 == 0, "output buffer is not a whole number of f32 values");
    Ok(src
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}


