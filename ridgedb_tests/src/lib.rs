#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod eval_test;
#[cfg(test)]
mod storage_test;
