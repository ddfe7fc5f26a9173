mod mat_mul;
mod rows;
