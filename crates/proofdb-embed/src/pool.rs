use anyhow::{ensure, Result};
use candle_core::{DType, Tensor, D};

fn epsilon(like: &Tensor) -> Result<Tensor> {
    let eps = if like.dtype() == DType::F16 { 1e-6f32 } else { 1e-12f32 };
    Ok(Tensor::new(eps, like.device())?.to_dtype(like.dtype())?)
}

/// Average of the token vectors whose mask entry is 1. `[B,T,H] -> [B,H]`.
fn masked_mean(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let weights = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let summed = hidden.mul(&weights)?.sum(1)?;
    let counts = mask.sum_keepdim(1)?.broadcast_add(&epsilon(mask)?)?;
    Ok(summed.broadcast_div(&counts)?)
}

fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let norms = rows.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?.broadcast_add(&epsilon(rows)?)?;
    Ok(rows.broadcast_div(&norms)?)
}

/// Sentence vector from BERT token states: masked mean over `T`, then unit
/// length per row. `hidden` is `[B,T,H]`, `attention_mask` is `[B,T]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _, width) = hidden.dims3().map_err(|_| anyhow::anyhow!("hidden states must be [B,T,H], got {:?}", hidden.dims()))?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let pooled = l2_normalize(&masked_mean(hidden, &mask)?)?;
    ensure!(pooled.dims() == [batch, width], "pooled shape {:?}, expected [{batch}, {width}]", pooled.dims());
    Ok(pooled)
}
