use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use half::f16;
use num_complex::Complex;
use std::io::Cursor;

use crate::error::{CodecError, CodecResult};

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

/// Element type of an [`NdArray`], named by its numpy dtype string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl DataType {
    /// Number of bytes per element.
    pub fn byte_size(&self) -> usize {
        match self {
            DataType::Bool | DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 | DataType::Float16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Complex64 => 8,
            DataType::Complex128 => 16,
        }
    }

    /// The dtype string used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float16 => "float16",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Complex64 => "complex64",
            DataType::Complex128 => "complex128",
        }
    }

    /// Parse a wire dtype string.
    pub fn parse(s: &str) -> Option<DataType> {
        match s {
            "bool" => Some(DataType::Bool),
            "int8" => Some(DataType::Int8),
            "int16" => Some(DataType::Int16),
            "int32" => Some(DataType::Int32),
            "int64" => Some(DataType::Int64),
            "uint8" => Some(DataType::UInt8),
            "uint16" => Some(DataType::UInt16),
            "uint32" => Some(DataType::UInt32),
            "uint64" => Some(DataType::UInt64),
            "float16" => Some(DataType::Float16),
            "float32" => Some(DataType::Float32),
            "float64" => Some(DataType::Float64),
            "complex64" => Some(DataType::Complex64),
            "complex128" => Some(DataType::Complex128),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// ArrayData  (typed flat buffer)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f32>>),
    Complex128(Vec<Complex<f64>>),
}

impl ArrayData {
    pub fn data_type(&self) -> DataType {
        match self {
            ArrayData::Bool(_) => DataType::Bool,
            ArrayData::Int8(_) => DataType::Int8,
            ArrayData::Int16(_) => DataType::Int16,
            ArrayData::Int32(_) => DataType::Int32,
            ArrayData::Int64(_) => DataType::Int64,
            ArrayData::UInt8(_) => DataType::UInt8,
            ArrayData::UInt16(_) => DataType::UInt16,
            ArrayData::UInt32(_) => DataType::UInt32,
            ArrayData::UInt64(_) => DataType::UInt64,
            ArrayData::Float16(_) => DataType::Float16,
            ArrayData::Float32(_) => DataType::Float32,
            ArrayData::Float64(_) => DataType::Float64,
            ArrayData::Complex64(_) => DataType::Complex64,
            ArrayData::Complex128(_) => DataType::Complex128,
        }
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::Int8(v) => v.len(),
            ArrayData::Int16(v) => v.len(),
            ArrayData::Int32(v) => v.len(),
            ArrayData::Int64(v) => v.len(),
            ArrayData::UInt8(v) => v.len(),
            ArrayData::UInt16(v) => v.len(),
            ArrayData::UInt32(v) => v.len(),
            ArrayData::UInt64(v) => v.len(),
            ArrayData::Float16(v) => v.len(),
            ArrayData::Float32(v) => v.len(),
            ArrayData::Float64(v) => v.len(),
            ArrayData::Complex64(v) => v.len(),
            ArrayData::Complex128(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// NdArray
// ---------------------------------------------------------------------------

/// N-dimensional numeric array: a typed flat buffer plus a row-major shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DataType,
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Build an array from a flat row-major buffer and its shape.
    /// Fails when the shape product does not match the buffer length.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> CodecResult<Self> {
        let count = element_count(&shape)?;
        if count != data.len() {
            return Err(CodecError::Encode(format!(
                "shape {:?} implies {} elements, buffer has {}",
                shape,
                count,
                data.len()
            )));
        }
        Ok(Self {
            dtype: data.data_type(),
            shape,
            data,
        })
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Serialize the flat buffer to little-endian bytes, row-major.
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        data_to_bytes(&self.data)
    }

    /// Rebuild an array from little-endian bytes.
    /// The payload length must be exactly `shape product * dtype byte size`.
    pub fn from_bytes(dtype: DataType, shape: Vec<usize>, bytes: &[u8]) -> CodecResult<Self> {
        let count = element_count(&shape)?;
        let expected = count
            .checked_mul(dtype.byte_size())
            .ok_or_else(|| CodecError::DecodeOverflow(format!("shape {shape:?} overflows")))?;
        if bytes.len() != expected {
            return Err(CodecError::MalformedDict(format!(
                "array payload is {} bytes, dtype {} with shape {:?} requires {}",
                bytes.len(),
                dtype,
                shape,
                expected
            )));
        }
        let data = bytes_to_data(dtype, bytes)?;
        Ok(Self { dtype, shape, data })
    }
}

/// Total element count implied by a shape, with overflow checking.
pub fn element_count(shape: &[usize]) -> CodecResult<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| {
        acc.checked_mul(dim)
            .ok_or_else(|| CodecError::DecodeOverflow(format!("shape {shape:?} overflows")))
    })
}

// ---------------------------------------------------------------------------
// Typed buffer -> little-endian bytes
// ---------------------------------------------------------------------------

fn data_to_bytes(data: &ArrayData) -> CodecResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * data.data_type().byte_size());
    let res = match data {
        ArrayData::Bool(v) => {
            out.extend(v.iter().map(|b| u8::from(*b)));
            Ok(())
        }
        ArrayData::Int8(v) => {
            out.extend(v.iter().map(|x| *x as u8));
            Ok(())
        }
        ArrayData::UInt8(v) => {
            out.extend_from_slice(v);
            Ok(())
        }
        ArrayData::Int16(v) => write_all(&mut out, v, |o, x| o.write_i16::<LittleEndian>(*x)),
        ArrayData::Int32(v) => write_all(&mut out, v, |o, x| o.write_i32::<LittleEndian>(*x)),
        ArrayData::Int64(v) => write_all(&mut out, v, |o, x| o.write_i64::<LittleEndian>(*x)),
        ArrayData::UInt16(v) => write_all(&mut out, v, |o, x| o.write_u16::<LittleEndian>(*x)),
        ArrayData::UInt32(v) => write_all(&mut out, v, |o, x| o.write_u32::<LittleEndian>(*x)),
        ArrayData::UInt64(v) => write_all(&mut out, v, |o, x| o.write_u64::<LittleEndian>(*x)),
        ArrayData::Float16(v) => {
            write_all(&mut out, v, |o, x| o.write_u16::<LittleEndian>(x.to_bits()))
        }
        ArrayData::Float32(v) => write_all(&mut out, v, |o, x| o.write_f32::<LittleEndian>(*x)),
        ArrayData::Float64(v) => write_all(&mut out, v, |o, x| o.write_f64::<LittleEndian>(*x)),
        ArrayData::Complex64(v) => write_all(&mut out, v, |o, c| {
            o.write_f32::<LittleEndian>(c.re)?;
            o.write_f32::<LittleEndian>(c.im)
        }),
        ArrayData::Complex128(v) => write_all(&mut out, v, |o, c| {
            o.write_f64::<LittleEndian>(c.re)?;
            o.write_f64::<LittleEndian>(c.im)
        }),
    };
    res.map_err(|e| CodecError::Encode(format!("failed to write array bytes: {e}")))?;
    Ok(out)
}

fn write_all<T, F>(out: &mut Vec<u8>, items: &[T], write: F) -> std::io::Result<()>
where
    F: Fn(&mut Vec<u8>, &T) -> std::io::Result<()>,
{
    for item in items {
        write(out, item)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Little-endian bytes -> typed buffer
// ---------------------------------------------------------------------------

/// Interpret raw little-endian bytes as a typed flat buffer.
/// Callers must have validated the payload length against the dtype already.
fn bytes_to_data(dtype: DataType, data: &[u8]) -> CodecResult<ArrayData> {
    match dtype {
        DataType::Bool => Ok(ArrayData::Bool(data.iter().map(|b| *b != 0).collect())),
        DataType::Int8 => Ok(ArrayData::Int8(data.iter().map(|b| *b as i8).collect())),
        DataType::UInt8 => Ok(ArrayData::UInt8(data.to_vec())),

        DataType::Int16 => read_vec_typed(data, 2, |c| c.read_i16::<LittleEndian>(), ArrayData::Int16),
        DataType::Int32 => read_vec_typed(data, 4, |c| c.read_i32::<LittleEndian>(), ArrayData::Int32),
        DataType::Int64 => read_vec_typed(data, 8, |c| c.read_i64::<LittleEndian>(), ArrayData::Int64),
        DataType::UInt16 => read_vec_typed(data, 2, |c| c.read_u16::<LittleEndian>(), ArrayData::UInt16),
        DataType::UInt32 => read_vec_typed(data, 4, |c| c.read_u32::<LittleEndian>(), ArrayData::UInt32),
        DataType::UInt64 => read_vec_typed(data, 8, |c| c.read_u64::<LittleEndian>(), ArrayData::UInt64),
        DataType::Float16 => read_vec_typed(
            data,
            2,
            |c| c.read_u16::<LittleEndian>().map(f16::from_bits),
            ArrayData::Float16,
        ),
        DataType::Float32 => read_vec_typed(data, 4, |c| c.read_f32::<LittleEndian>(), ArrayData::Float32),
        DataType::Float64 => read_vec_typed(data, 8, |c| c.read_f64::<LittleEndian>(), ArrayData::Float64),
        DataType::Complex64 => read_vec_typed(
            data,
            8,
            |c| {
                let re = c.read_f32::<LittleEndian>()?;
                let im = c.read_f32::<LittleEndian>()?;
                Ok(Complex::new(re, im))
            },
            ArrayData::Complex64,
        ),
        DataType::Complex128 => read_vec_typed(
            data,
            16,
            |c| {
                let re = c.read_f64::<LittleEndian>()?;
                let im = c.read_f64::<LittleEndian>()?;
                Ok(Complex::new(re, im))
            },
            ArrayData::Complex128,
        ),
    }
}

/// Helper: read a vector of a fixed-size element type.
fn read_vec_typed<T, F>(
    data: &[u8],
    elem_size: usize,
    read: F,
    wrap: fn(Vec<T>) -> ArrayData,
) -> CodecResult<ArrayData>
where
    F: Fn(&mut Cursor<&[u8]>) -> std::io::Result<T>,
{
    let count = data.len() / elem_size;
    let mut out = Vec::with_capacity(count);
    let mut cursor = Cursor::new(data);
    for _ in 0..count {
        let val = read(&mut cursor)
            .map_err(|e| CodecError::Decode(format!("failed to read array element: {e}")))?;
        out.push(val);
    }
    Ok(wrap(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dtype_names_round_trip() {
        for dt in [
            DataType::Bool,
            DataType::Int64,
            DataType::UInt16,
            DataType::Float16,
            DataType::Complex128,
        ] {
            assert_eq!(DataType::parse(dt.name()), Some(dt));
        }
        assert_eq!(DataType::parse("float128"), None);
    }

    #[test]
    fn int64_bytes_are_little_endian() {
        let arr = NdArray::new(vec![2], ArrayData::Int64(vec![1, -2])).unwrap();
        let bytes = arr.to_bytes().unwrap();
        assert_eq!(bytes[..8], [1u8, 0, 0, 0, 0, 0, 0, 0][..]);
        assert_eq!(bytes[8..], (-2i64).to_le_bytes()[..]);
        let back = NdArray::from_bytes(DataType::Int64, vec![2], &bytes).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn complex_and_half_round_trip() {
        let arr = NdArray::new(
            vec![2],
            ArrayData::Complex64(vec![Complex::new(1.5, -2.5), Complex::new(0.0, 3.0)]),
        )
        .unwrap();
        let bytes = arr.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16);
        let back = NdArray::from_bytes(DataType::Complex64, vec![2], &bytes).unwrap();
        assert_eq!(back, arr);

        let half = NdArray::new(
            vec![3],
            ArrayData::Float16(vec![f16::from_f32(1.0), f16::ZERO, f16::from_f32(-0.5)]),
        )
        .unwrap();
        let bytes = half.to_bytes().unwrap();
        let back = NdArray::from_bytes(DataType::Float16, vec![3], &bytes).unwrap();
        assert_eq!(back, half);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = NdArray::new(vec![2, 2], ArrayData::Int32(vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, CodecError::Encode(_)));

        let err = NdArray::from_bytes(DataType::Int32, vec![2], &[0u8; 7]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDict(_)));
    }

    #[test]
    fn zero_sized_shapes_are_fine() {
        let arr = NdArray::new(vec![0, 3], ArrayData::Float64(vec![])).unwrap();
        let bytes = arr.to_bytes().unwrap();
        assert!(bytes.is_empty());
        let back = NdArray::from_bytes(DataType::Float64, vec![0, 3], &bytes).unwrap();
        assert_eq!(back, arr);
    }
}
