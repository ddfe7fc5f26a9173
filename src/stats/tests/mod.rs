mod collector;
mod lift;
