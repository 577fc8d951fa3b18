use crate::core::digit::weights::{ModelWeights, TensorData};
use crate::utils::error::{EchoError, Result};

pub const INPUT_SIZE: usize = 28;
pub const NUM_CLASSES: usize = 10;

/// Square-kernel convolution, stride 1, zero padding `kernel / 2`.
#[derive(Debug, Clone)]
struct Conv2d {
    in_channels: usize,
    out_channels: usize,
    kernel: usize,
    weight: Vec<f32>,
    bias: Vec<f32>,
}

impl Conv2d {
    fn from_tensors(weight: TensorData, bias: TensorData) -> Self {
        Self {
            out_channels: weight.shape[0],
            in_channels: weight.shape[1],
            kernel: weight.shape[2],
            weight: weight.data,
            bias: bias.data,
        }
    }

    fn forward(&self, input: &[f32], height: usize, width: usize) -> Vec<f32> {
        let pad = (self.kernel / 2) as isize;
        let plane = height * width;
        let mut output = vec![0.0f32; self.out_channels * plane];

        for oc in 0..self.out_channels {
            let out_plane = &mut output[oc * plane..(oc + 1) * plane];
            for y in 0..height {
                for x in 0..width {
                    let mut acc = self.bias[oc];
                    for ic in 0..self.in_channels {
                        let in_plane = &input[ic * plane..(ic + 1) * plane];
                        let w_base = (oc * self.in_channels + ic) * self.kernel * self.kernel;
                        for ky in 0..self.kernel {
                            let iy = y as isize + ky as isize - pad;
                            if iy < 0 || iy >= height as isize {
                                continue;
                            }
                            for kx in 0..self.kernel {
                                let ix = x as isize + kx as isize - pad;
                                if ix < 0 || ix >= width as isize {
                                    continue;
                                }
                                acc += in_plane[iy as usize * width + ix as usize]
                                    * self.weight[w_base + ky * self.kernel + kx];
                            }
                        }
                    }
                    out_plane[y * width + x] = acc;
                }
            }
        }
        output
    }
}

#[derive(Debug, Clone)]
struct Linear {
    in_features: usize,
    weight: Vec<f32>,
    bias: Vec<f32>,
}

impl Linear {
    fn from_tensors(weight: TensorData, bias: TensorData) -> Self {
        Self {
            in_features: weight.shape[1],
            weight: weight.data,
            bias: bias.data,
        }
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.bias
            .iter()
            .enumerate()
            .map(|(o, b)| {
                let row = &self.weight[o * self.in_features..(o + 1) * self.in_features];
                b + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>()
            })
            .collect()
    }
}

fn relu_in_place(values: &mut [f32]) {
    for v in values.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}

/// 2x2 max pooling, stride 2, per channel.
fn max_pool2(input: &[f32], channels: usize, height: usize, width: usize) -> Vec<f32> {
    let (oh, ow) = (height / 2, width / 2);
    let mut output = Vec::with_capacity(channels * oh * ow);
    for c in 0..channels {
        let plane = &input[c * height * width..(c + 1) * height * width];
        for y in 0..oh {
            for x in 0..ow {
                let (y0, x0) = (y * 2, x * 2);
                let m = plane[y0 * width + x0]
                    .max(plane[y0 * width + x0 + 1])
                    .max(plane[(y0 + 1) * width + x0])
                    .max(plane[(y0 + 1) * width + x0 + 1]);
                output.push(m);
            }
        }
    }
    output
}

/// Index of the largest logit; the first one wins on ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// MNIST-shaped CNN: two conv/relu/pool stages, then two dense layers.
/// Dropout layers are identities at inference time and are not represented.
#[derive(Debug, Clone)]
pub struct DigitNet {
    conv1: Conv2d,
    conv2: Conv2d,
    fc1: Linear,
    fc2: Linear,
}

impl DigitNet {
    pub fn from_weights(mut weights: ModelWeights) -> Result<Self> {
        weights
            .check_shapes()
            .map_err(|message| EchoError::ModelLoadError {
                path: "<memory>".to_string(),
                message,
            })?;

        let mut take = |name: &str| {
            weights.take(name).ok_or_else(|| EchoError::ModelLoadError {
                path: "<memory>".to_string(),
                message: format!("missing tensor '{}'", name),
            })
        };

        Ok(Self {
            conv1: Conv2d::from_tensors(take("conv1.weight")?, take("conv1.bias")?),
            conv2: Conv2d::from_tensors(take("conv2.weight")?, take("conv2.bias")?),
            fc1: Linear::from_tensors(take("fc1.weight")?, take("fc1.bias")?),
            fc2: Linear::from_tensors(take("fc2.weight")?, take("fc2.bias")?),
        })
    }

    /// `input` is one normalised 28x28 grayscale plane, row-major.
    pub fn logits(&self, input: &[f32]) -> Vec<f32> {
        let mut x = self.conv1.forward(input, INPUT_SIZE, INPUT_SIZE);
        relu_in_place(&mut x);
        let x = max_pool2(&x, self.conv1.out_channels, INPUT_SIZE, INPUT_SIZE);

        let half = INPUT_SIZE / 2;
        let mut x = self.conv2.forward(&x, half, half);
        relu_in_place(&mut x);
        let x = max_pool2(&x, self.conv2.out_channels, half, half);

        let mut x = self.fc1.forward(&x);
        relu_in_place(&mut x);
        self.fc2.forward(&x)
    }

    pub fn predict(&self, input: &[f32]) -> u8 {
        argmax(&self.logits(input)) as u8
    }
}
