use heap32::{BumpAllocator, FreeListAllocator, Heap, HeapConfig, HeapError};
use tracing_subscriber::EnvFilter;

/// Prints the free list the way a raw-memory inspector would see it.
fn print_free_list(heap: &FreeListAllocator) {
  print!("    free list:");

  for block in heap.free_blocks() {
    match block {
      Ok(block) => print!(" [{:#010x}: {} bytes]", block.addr, block.size),
      Err(err) => print!(" <{err}>"),
    }
  }

  println!();
}

fn bump_tour() -> Result<(), HeapError> {
  println!("== bump allocator ==");

  // The conventional heap window: 0x0002_0000..0x0008_0000.
  let mut heap = BumpAllocator::init(HeapConfig::default())?;
  println!("[1] {} bytes available from {:#010x}", heap.remaining(), heap.start());

  // ------------------------------------------------------------------
  // 1) Odd-sized requests are rounded up to 4 bytes.
  // ------------------------------------------------------------------
  let word = heap.alloc(4)?;
  heap.region_mut().write_u32(word, 0xDEAD_BEEF)?;
  let odd = heap.alloc(5)?;
  println!("[2] alloc(4) = {word:#010x}, alloc(5) = {odd:#010x}, cursor = {:#010x}", heap.cursor());

  // ------------------------------------------------------------------
  // 2) calloc hands out zeroed memory.
  // ------------------------------------------------------------------
  let table = heap.calloc(16, 4)?;
  let zeroed = heap.region().bytes(table, 64)?.iter().all(|&b| b == 0);
  println!("[3] calloc(16, 4) = {table:#010x}, zeroed = {zeroed}");

  // ------------------------------------------------------------------
  // 3) free does nothing; reset reclaims everything at once.
  // ------------------------------------------------------------------
  heap.free(word);
  println!("[4] after free: {} bytes remaining", heap.remaining());
  heap.reset();
  let remaining = heap.remaining();
  println!("[5] after reset: {remaining} bytes remaining, next alloc at {:#010x}", heap.alloc(1)?);

  Ok(())
}

fn free_list_tour() -> Result<(), HeapError> {
  println!("\n== free-list allocator ==");

  let mut heap = FreeListAllocator::init(HeapConfig::new(0x0002_0000, 64))?;
  print_free_list(&heap);

  // ------------------------------------------------------------------
  // 1) alloc(10) rounds to 12 and splits the single 56-byte block.
  // ------------------------------------------------------------------
  let first = heap.alloc(10)?;
  println!("[1] alloc(10) = {first:#010x}");
  print_free_list(&heap);

  // ------------------------------------------------------------------
  // 2) Only 36 bytes are left in one piece.
  // ------------------------------------------------------------------
  match heap.alloc(40) {
    Ok(addr) => println!("[2] alloc(40) = {addr:#010x}"),
    Err(err) => println!("[2] alloc(40) failed: {err}"),
  }

  // ------------------------------------------------------------------
  // 3) The freed block goes on the head and is found first.
  // ------------------------------------------------------------------
  heap.free(first)?;
  println!("[3] free({first:#010x})");
  print_free_list(&heap);

  let again = heap.alloc(8)?;
  println!(
    "[4] alloc(8) = {again:#010x}, reused first block? {}, block size = {}",
    again == first,
    heap.block_size(again)?
  );

  // ------------------------------------------------------------------
  // 4) Freeing twice is refused when asked to check.
  // ------------------------------------------------------------------
  heap.free_checked(again)?;
  if let Err(err) = heap.free_checked(again) {
    println!("[5] second free_checked: {err}");
  }

  println!("[6] {} free blocks, {} free bytes", heap.validate()?, heap.remaining());

  Ok(())
}

fn main() -> Result<(), HeapError> {
  // RUST_LOG=heap32=trace shows every split and free.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  bump_tour()?;
  free_list_tour()
}
