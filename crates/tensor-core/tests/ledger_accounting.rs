// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: tensor lifecycles against the global ledger.
//!
//! Every test here reads [`Tensor::global_size_bytes`] before and after the
//! code under test, so they all hold `LEDGER_LOCK` for their whole body.
//! Tests in this file are the only users of the ledger in this process.

use std::sync::{Mutex, MutexGuard};

use memory_ledger::MemoryLedger;
use tensor_core::ops::{
    batch_norm_2d, linear, linear_with, BatchNormParams, LinearParams, ReleaseMode,
};
use tensor_core::{DType, Tensor, TensorError};

static LEDGER_LOCK: Mutex<()> = Mutex::new(());

fn lock_ledger() -> MutexGuard<'static, ()> {
    LEDGER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn sequential(extents: &[usize]) -> Tensor {
    Tensor::from_fn(extents, |i| i as f32).unwrap()
}

// ── Lifecycle ──────────────────────────────────────────────────

#[test]
fn test_create_release_restores_ledger() {
    let _guard = lock_ledger();
    let before = Tensor::global_size_bytes();

    let a = Tensor::create(DType::F32, 3, &[2, 3, 2]).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + 48);
    let b = Tensor::new(DType::I16, &[5]).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + 58);

    a.release().unwrap();
    b.release().unwrap();
    assert_eq!(Tensor::global_size_bytes(), before);
}

#[test]
fn test_drop_restores_ledger() {
    let _guard = lock_ledger();
    let before = Tensor::global_size_bytes();
    {
        let _t = Tensor::new(DType::F64, &[4, 4]).unwrap();
        assert_eq!(Tensor::global_size_bytes(), before + 128);
    }
    assert_eq!(Tensor::global_size_bytes(), before);
}

#[test]
fn test_failed_create_touches_nothing() {
    let _guard = lock_ledger();
    let before = Tensor::global_size_bytes();
    assert!(Tensor::create(DType::F32, 2, &[3]).is_err());
    assert!(Tensor::new(DType::F32, &[3, 0]).is_err());
    assert!(Tensor::from_vec(&[2, 2], vec![1i32; 3]).is_err());
    assert_eq!(Tensor::global_size_bytes(), before);
}

#[test]
fn test_adopt_buffer_keeps_footprint() {
    let _guard = lock_ledger();
    let before = Tensor::global_size_bytes();
    let mut t = Tensor::new(DType::I32, &[4]).unwrap();
    t.adopt_buffer(vec![1i32, 2, 3, 4].into()).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + 16);
    t.release().unwrap();
    assert_eq!(Tensor::global_size_bytes(), before);
}

#[test]
fn test_shape_transforms_do_not_allocate() {
    let _guard = lock_ledger();
    let mut t = sequential(&[3, 5]);
    let before = Tensor::global_size_bytes();

    t.transpose(0, 1).unwrap().unsqueeze(0).unwrap();
    t.squeeze(0).unwrap().reshape(&[15]).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before);

    let contiguous = t.to_contiguous().unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + 60);
    contiguous.release().unwrap();
    t.release().unwrap();
}

#[test]
fn test_release_underflow_surfaces_and_keeps_total() {
    let _guard = lock_ledger();
    let ledger = MemoryLedger::global();

    let t = Tensor::new(DType::I64, &[8]).unwrap();
    let footprint = t.size_bytes();
    // Take the books below the tensor's footprint.
    let held = ledger.allocated_bytes();
    let borrowed = held - footprint / 2;
    ledger.release(borrowed).unwrap();
    let short = ledger.allocated_bytes();

    let err = t.release().unwrap_err();
    assert!(matches!(
        err,
        TensorError::LedgerUnderflow(memory_ledger::LedgerError::Underflow {
            requested: 64,
            ..
        })
    ));
    assert_eq!(ledger.allocated_bytes(), short);

    // The refused footprint is still on the books; settle it and restore.
    ledger.register(borrowed);
    ledger.release(footprint).unwrap();
    assert_eq!(ledger.allocated_bytes(), held - footprint);
}

// ── Kernels ────────────────────────────────────────────────────

#[test]
fn test_linear_reference_case() {
    let _guard = lock_ledger();
    let input = sequential(&[3, 5]);
    let weight = sequential(&[2, 5]);
    let bias = sequential(&[2]);
    let params = LinearParams::new(weight, Some(bias)).unwrap();

    let before = Tensor::global_size_bytes();
    let output = linear(&input, &params).unwrap();
    assert_eq!(output.extents(), &[3, 2]);
    assert_eq!(output.get::<f32>(&[0, 0]).unwrap(), 30.0);
    // Only the output itself is left behind.
    assert_eq!(Tensor::global_size_bytes(), before + output.size_bytes());

    output.release().unwrap();
    input.release().unwrap();
    params.release(ReleaseMode::Deep).unwrap();
}

#[test]
fn test_unsupported_linear_leaves_ledger_unchanged() {
    let _guard = lock_ledger();
    let input = Tensor::new(DType::I16, &[3, 5]).unwrap();
    let weight = Tensor::new(DType::I16, &[2, 5]).unwrap();

    let before = Tensor::global_size_bytes();
    let err = linear_with(&input, &weight, None).unwrap_err();
    assert_eq!(
        err,
        TensorError::UnsupportedDType {
            op: "linear",
            dtype: DType::I16
        }
    );
    assert_eq!(Tensor::global_size_bytes(), before);

    input.release().unwrap();
    weight.release().unwrap();
}

#[test]
fn test_shape_error_leaves_ledger_unchanged() {
    let _guard = lock_ledger();
    let input = sequential(&[3, 4]);
    let weight = sequential(&[2, 5]);

    let before = Tensor::global_size_bytes();
    assert!(linear_with(&input, &weight, None).is_err());
    assert_eq!(Tensor::global_size_bytes(), before);

    input.release().unwrap();
    weight.release().unwrap();
}

#[test]
fn test_batch_norm_scratch_leaves_no_residue() {
    let _guard = lock_ledger();
    let input = sequential(&[2, 3, 2, 2]);
    let per_channel = |v: f32| Tensor::from_fn(&[3], |_| v).unwrap();
    // No epsilon, so the kernel also builds a default-epsilon scratch tensor.
    let params = BatchNormParams::new(
        per_channel(1.0),
        per_channel(4.0),
        None,
        per_channel(2.0),
        per_channel(0.0),
    )
    .unwrap();

    let before = Tensor::global_size_bytes();
    let output = batch_norm_2d(&input, &params).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + output.size_bytes());

    output.release().unwrap();
    assert_eq!(Tensor::global_size_bytes(), before);
    input.release().unwrap();
    params.release(ReleaseMode::Deep).unwrap();
}

#[test]
fn test_batch_norm_identity_returns_input() {
    let _guard = lock_ledger();
    let input = sequential(&[1, 2, 2, 3]);
    let per_channel = |v: f32| Tensor::from_fn(&[2], |_| v).unwrap();
    let params = BatchNormParams::new(
        per_channel(0.0),
        per_channel(1.0),
        Some(per_channel(0.0)),
        per_channel(1.0),
        per_channel(0.0),
    )
    .unwrap();

    let output = batch_norm_2d(&input, &params).unwrap();
    assert_eq!(
        output.as_slice::<f32>().unwrap(),
        input.as_slice::<f32>().unwrap()
    );
}

// ── Parameter release ──────────────────────────────────────────

#[test]
fn test_deep_release_restores_ledger() {
    let _guard = lock_ledger();
    let before = Tensor::global_size_bytes();

    let params = LinearParams::new(sequential(&[2, 5]), Some(sequential(&[2]))).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + 48);
    assert!(params.release(ReleaseMode::Deep).unwrap().is_none());
    assert_eq!(Tensor::global_size_bytes(), before);
}

#[test]
fn test_shallow_release_keeps_tensors_live() {
    let _guard = lock_ledger();
    let before = Tensor::global_size_bytes();

    let params = LinearParams::new(sequential(&[2, 5]), None).unwrap();
    let parts = params.release(ReleaseMode::Shallow).unwrap().unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + 40);
    assert_eq!(parts.weight.get::<f32>(&[1, 4]).unwrap(), 9.0);
    assert!(parts.bias.is_none());

    parts.weight.release().unwrap();
    assert_eq!(Tensor::global_size_bytes(), before);
}

#[test]
fn test_batch_norm_params_deep_release() {
    let _guard = lock_ledger();
    let before = Tensor::global_size_bytes();

    let one = || sequential(&[4]);
    let params = BatchNormParams::new(one(), one(), Some(one()), one(), one()).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before + 5 * 16);
    params.release(ReleaseMode::Deep).unwrap();
    assert_eq!(Tensor::global_size_bytes(), before);
}

// ── Statistics ─────────────────────────────────────────────────

#[test]
fn test_stats_count_tensor_traffic() {
    let _guard = lock_ledger();
    let start = MemoryLedger::global().stats();

    let t = Tensor::new(DType::I64, &[8]).unwrap();
    t.release().unwrap();

    let stats = MemoryLedger::global().stats();
    assert_eq!(stats.registrations, start.registrations + 1);
    assert_eq!(stats.releases, start.releases + 1);
    assert_eq!(
        stats.cumulative_registered_bytes,
        start.cumulative_registered_bytes + 64
    );
    assert!(stats.peak_allocated_bytes >= 64);
}
