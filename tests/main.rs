mod mock;
mod signal;
