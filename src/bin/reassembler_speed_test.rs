use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use riptide::tcp::StreamReassembler;
use std::collections::VecDeque;
use std::io::{self, Error, ErrorKind, Read};
use std::time::Instant;

fn speed_test(num_chunks: usize, capacity: usize, random_seed: u64) -> io::Result<()> {
    // Generate random data
    let mut rng = StdRng::seed_from_u64(random_seed);
    let mut data = vec![0u8; num_chunks * capacity];
    rng.fill_bytes(&mut data);

    // Split data into overlapping substrings, each shifted back a little to
    // exercise the merge path
    let mut chunks: VecDeque<(usize, &[u8], bool)> = VecDeque::new();
    for i in (0..data.len()).step_by(capacity) {
        let start = i.saturating_sub(16);
        let end = usize::min(i + capacity, data.len());
        let is_last = end == data.len();
        chunks.push_back((start, &data[start..end], is_last));
    }

    // Set up StreamReassembler and output buffer
    let mut ra = StreamReassembler::new(capacity);
    let mut output_buffer = Vec::with_capacity(data.len());

    // Start timer
    let t0 = Instant::now();

    // Run simulation
    while let Some((index, substring, is_last)) = chunks.pop_front() {
        ra.push_substring(substring, index as u64, is_last);
        ra.stream_out_mut().read_to_end(&mut output_buffer)?;
    }

    let duration = t0.elapsed();

    if !ra.stream_out().eof() {
        return Err(Error::new(
            ErrorKind::Other,
            "StreamReassembler did not close the ByteStream when finished",
        ));
    }

    if data != output_buffer {
        return Err(Error::new(
            ErrorKind::Other,
            "Mismatch between data written and data read",
        ));
    }

    // Calculate throughput
    let duration_secs = duration.as_secs_f64();
    let bytes_per_sec = (num_chunks * capacity) as f64 / duration_secs;
    let gigabits_per_sec = bytes_per_sec * 8.0 / 1e9;

    println!(
        "StreamReassembler to ByteStream with capacity={capacity} \
        reached {gigabits_per_sec:.2} Gbit/s"
    );

    Ok(())
}

fn main() {
    let num_chunks = 10_000;
    let capacity = 1500;
    let random_seed = 1370;

    if let Err(e) = speed_test(num_chunks, capacity, random_seed) {
        eprintln!("Speed test failed: {e}");
        std::process::exit(1);
    }
}
