use pyo3::{exceptions::PyRuntimeError, prelude::*};

use crate::{config::EvalConfig, error::GraderError, tool::runner::Runner};

fn to_py_err(error: GraderError) -> PyErr {
    PyRuntimeError::new_err(error.to_string())
}

/// Python handle on a built runner.
#[pyclass(name = "Runner")]
pub struct PyRunner {
    inner: Runner,
}

#[pymethods]
impl PyRunner {
    #[new]
    #[pyo3(signature = (data_dir=None))]
    pub fn new(data_dir: Option<String>) -> PyResult<Self> {
        let config = match data_dir {
            Some(dir) => EvalConfig::with_data_dir(dir),
            None => EvalConfig::from_env(),
        };
        let inner = Runner::from_config(config).map_err(to_py_err)?;
        Ok(PyRunner { inner })
    }

    /// Grades `completion` and returns the response envelope as JSON text.
    pub fn run(&self, py: Python<'_>, id: String, completion: String) -> PyResult<String> {
        let response = py
            .detach(|| self.inner.run(&id, &completion))
            .map_err(to_py_err)?;
        serde_json::to_string(&response).map_err(|e| to_py_err(e.into()))
    }

    pub fn get_category(&self, id: &str) -> PyResult<String> {
        self.inner.get_category(id).map_err(to_py_err)
    }
}

#[pymodule]
pub mod bfcl_checker {
    #[pymodule_export]
    use super::PyRunner;
}
