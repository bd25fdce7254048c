//! Bit decomposition and packing between field variables and booleans.

use ark_ff::{BigInteger, One, PrimeField, Zero};
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::SynthesisError;

use super::fields::fpc;

/// Pack little-endian booleans into a field variable: `Σ 2^i b_i`. Linear.
pub fn le_bits_to_fp<F: PrimeField>(bits: &[Boolean<F>]) -> FpVar<F> {
    let mut acc = FpVar::Constant(F::zero());
    let mut coeff = F::one();
    for bit in bits {
        acc += &FpVar::from(bit.clone()) * &fpc(coeff);
        coeff.double_in_place();
    }
    acc
}

/// Decompose a field variable into `num_bits` little-endian boolean
/// witnesses and constrain the packing to equal the variable.
///
/// The decomposition is unique below `2^num_bits`; callers pick `num_bits`
/// as the nested scalar field's modulus bit length, so a nested scalar and
/// its wrapping-field embedding share one bit representation.
pub fn unpack_into_bits<F: PrimeField>(
    var: &FpVar<F>,
    num_bits: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    let cs = var.cs();
    let value = var.value();
    let mut bits = Vec::with_capacity(num_bits);
    for i in 0..num_bits {
        let bit_value = match &value {
            Ok(v) => Ok(v.into_bigint().get_bit(i)),
            Err(_) => Err(SynthesisError::AssignmentMissing),
        };
        bits.push(Boolean::new_witness(cs.clone(), || bit_value)?);
    }
    le_bits_to_fp(&bits).enforce_equal(var)?;
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::Fq;
    use ark_ff::UniformRand;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    #[test]
    fn roundtrip() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let v = Fq::from(u64::rand(&mut rng));
        let var = FpVar::new_witness(cs.clone(), || Ok(v)).unwrap();
        let bits = unpack_into_bits(&var, 64).unwrap();
        assert_eq!(le_bits_to_fp(&bits).value().unwrap(), v);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn too_few_bits_is_unsatisfiable() {
        let cs = ConstraintSystem::<Fq>::new_ref();
        let var = FpVar::new_witness(cs.clone(), || Ok(Fq::from(1u64 << 20))).unwrap();
        let _ = unpack_into_bits(&var, 8).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
