use burn::prelude::*;
use burn::tensor::TensorData;

use crate::env::Observation;
use crate::game::cell::{is_number, CLOSED, FLAGGED};

/// Number of input planes produced by [`encode_observation`].
pub const CHANNELS: usize = 5;

/// Encode an observation as a tensor of shape [5, H, W].
///
/// Channel 0: closed cells
/// Channel 1: revealed numbers scaled to 0..=1
/// Channel 2: flags
/// Channel 3: mines and unrecognized cells
/// Channel 4: game status code / 2, constant across the plane
pub fn encode_observation<B: Backend>(observation: &Observation, device: &B::Device) -> Tensor<B, 3> {
    let (h, w) = (observation.board.height(), observation.board.width());
    let data = encode_flat(observation);
    Tensor::<B, 1>::from_data(TensorData::from(data.as_slice()), device)
        .reshape([CHANNELS as i32, h as i32, w as i32])
}

/// Encode a batch as [batch, 5, H, W]. All boards must share one size.
pub fn encode_batch<'a, B, I>(observations: I, height: usize, width: usize, device: &B::Device) -> Tensor<B, 4>
where
    B: Backend,
    I: IntoIterator<Item = &'a Observation>,
{
    let mut flat = Vec::new();
    let mut batch = 0;
    for obs in observations {
        flat.extend_from_slice(&encode_flat(obs));
        batch += 1;
    }
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device).reshape([
        batch as i32,
        CHANNELS as i32,
        height as i32,
        width as i32,
    ])
}

/// Flat [5 * H * W] encoding.
pub fn encode_flat(observation: &Observation) -> Vec<f32> {
    let board = &observation.board;
    let plane = board.len();
    let mut data = vec![0.0f32; CHANNELS * plane];

    for (idx, &code) in board.cells().iter().enumerate() {
        if code == CLOSED {
            data[idx] = 1.0;
        } else if is_number(code) {
            data[plane + idx] = code as f32 / 8.0;
        } else if code == FLAGGED {
            data[2 * plane + idx] = 1.0;
        } else {
            data[3 * plane + idx] = 1.0;
        }
    }

    let status = observation.status_code() as f32 / 2.0;
    data[4 * plane..].fill(status);

    data
}
