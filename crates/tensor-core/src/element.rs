// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scalar types that can live in a tensor buffer.

use crate::{Buffer, DType};

/// A Rust scalar type backing one [`DType`].
///
/// `Element` ties a Rust type to its dtype tag and to the matching
/// [`Buffer`] variant, which is what lets typed accessors such as
/// [`Tensor::get`](crate::Tensor::get) reject the wrong type at runtime
/// with `TypeMismatch` instead of reinterpreting bytes.
pub trait Element:
    num_traits::Num + num_traits::NumCast + Copy + PartialOrd + std::fmt::Debug + Send + Sync + 'static
{
    /// The dtype tag for this type.
    const DTYPE: DType;

    /// Borrows the buffer's elements if it holds this type.
    fn slice(buffer: &Buffer) -> Option<&[Self]>;

    /// Mutably borrows the buffer's elements if it holds this type.
    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;

    /// Wraps a vector of this type in the matching buffer variant.
    fn into_buffer(values: Vec<Self>) -> Buffer;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            fn slice(buffer: &Buffer) -> Option<&[Self]> {
                match buffer {
                    Buffer::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
                match buffer {
                    Buffer::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_buffer(values: Vec<Self>) -> Buffer {
                Buffer::$variant(values)
            }
        }
    };
}

impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(f32, F32);
impl_element!(f64, F64);
