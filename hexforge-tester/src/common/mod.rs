pub mod util;

pub use util::{read_board_file, split_csv};
