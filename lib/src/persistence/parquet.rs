//! Parquet file writer
use crate::errors::PersistenceError;
use crate::ProcessedFrame;
use arrow::array::{ArrayRef, Float32Builder, ListBuilder, UInt32Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

/// Create cube schema
///
/// The cube is stored flattened in row-major order, `shape` restores it.
fn create_cube_schema() -> Schema {
    let list_of = |item: DataType| DataType::List(Arc::new(Field::new("item", item, true)));
    Schema::new(vec![
        Field::new("frame_index", DataType::UInt32, false),
        Field::new("shape", list_of(DataType::UInt32), false),
        Field::new("re", list_of(DataType::Float32), false),
        Field::new("im", list_of(DataType::Float32), false),
    ])
}

/// A batch writer to write batches of radar cubes to a Parquet file.
pub struct BatchWriter {
    file_path: PathBuf,
    writer: Option<ArrowWriter<File>>,
}

impl BatchWriter {
    pub fn new(file_path: PathBuf) -> Result<Self, PersistenceError> {
        let file = File::create(&file_path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let writer = ArrowWriter::try_new(file, Arc::new(create_cube_schema()), Some(props))?;
        Ok(Self {
            file_path,
            writer: Some(writer),
        })
    }

    /// Write a record batch
    fn write(&mut self, batch: RecordBatch) -> Result<(), PersistenceError> {
        if let Some(writer) = &mut self.writer {
            writer.write(&batch)?;
            Ok(())
        } else {
            Err(PersistenceError::Parquet(
                "Writer has been finalized".into(),
            ))
        }
    }

    /// Finalize the writer by taking ownership and closing it.
    ///
    /// Returns the size of the finished file.
    pub fn finalize(&mut self) -> Result<u64, PersistenceError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| PersistenceError::Parquet("Writer already finalized".into()))?;
        let _metadata = writer.close()?;

        Ok(std::fs::metadata(&self.file_path)?.len())
    }

    /// Add a batch of processed frames, one row each.
    pub fn add_batch(&mut self, data: &[ProcessedFrame]) -> Result<(), PersistenceError> {
        let mut index_builder = UInt32Builder::with_capacity(data.len());
        let mut shape_builder = ListBuilder::new(UInt32Builder::new());
        let mut re_builder = ListBuilder::new(Float32Builder::new());
        let mut im_builder = ListBuilder::new(Float32Builder::new());

        for frame in data {
            index_builder.append_value(frame.index as u32);

            for extent in frame.cube.shape() {
                shape_builder.values().append_value(extent as u32);
            }
            shape_builder.append(true);

            for sample in frame.cube.as_array().iter() {
                re_builder.values().append_value(sample.re);
                im_builder.values().append_value(sample.im);
            }
            re_builder.append(true);
            im_builder.append(true);
        }

        let arrays = vec![
            Arc::new(index_builder.finish()) as ArrayRef,
            Arc::new(shape_builder.finish()) as ArrayRef,
            Arc::new(re_builder.finish()) as ArrayRef,
            Arc::new(im_builder.finish()) as ArrayRef,
        ];

        let batch = RecordBatch::try_new(Arc::new(create_cube_schema()), arrays)?;
        log::trace!("Writing batch of {} frames to parquet", data.len());
        self.write(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameGeometry, FramePipeline};
    use arrow::array::{Array, Float32Array, ListArray, UInt32Array};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    #[test]
    fn test_cube_round_trips_through_parquet() {
        let geometry = FrameGeometry::new(2, 1, 2, 1).unwrap();
        let pipeline = FramePipeline::new(geometry);
        let frames = vec![
            pipeline.process_frame(3, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
            pipeline.process_frame(4, vec![-1; 8]).unwrap(),
        ];

        let path =
            std::env::temp_dir().join(format!("radcube_parquet_{}.parquet", std::process::id()));
        let mut writer = BatchWriter::new(path.clone()).unwrap();
        writer.add_batch(&frames).unwrap();
        assert!(writer.finalize().unwrap() > 0);

        let file = File::open(&path).unwrap();
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batch = reader.next().unwrap().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(batch.num_rows(), 2);
        let index = batch
            .column(0)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .unwrap();
        assert_eq!(index.values().to_vec(), vec![3, 4]);

        let shapes = batch.column(1).as_any().downcast_ref::<ListArray>().unwrap();
        let shape = shapes.value(0);
        let shape = shape.as_any().downcast_ref::<UInt32Array>().unwrap();
        assert_eq!(shape.values().to_vec(), vec![1, 2, 2, 1]);

        let re = batch.column(2).as_any().downcast_ref::<ListArray>().unwrap();
        let re = re.value(0);
        let re = re.as_any().downcast_ref::<Float32Array>().unwrap();
        assert_eq!(re.values().to_vec(), vec![1.0, 5.0, 2.0, 6.0]);
        assert_eq!(re.len(), 4);
    }
}
