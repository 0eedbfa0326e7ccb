pub mod trip_segmenter;
