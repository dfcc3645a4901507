use alloy_sol_types::sol;

sol! {
    interface IRngOracle {
        event RequestedH13RandomNumber(uint256 id, address caller);
        event RequestedH35RandomNumber(uint256 id, address caller);
        event RequestedG13RandomNumber(uint256 id, address caller);
        event RequestedG35RandomNumber(uint256 id, address caller);
        event RequestedHDLRandomNumber(uint256 id, address caller);
        event RequestedH13BatchRandomNumber(uint256 id, address caller);
        event RequestedH35BatchRandomNumber(uint256 id, address caller);
        event RequestedG13BatchRandomNumber(uint256 id, address caller);
        event RequestedG35BatchRandomNumber(uint256 id, address caller);

        function setH13RandomNumber(uint256 random_number, address caller_address, uint256 id) external;
        function setH35RandomNumber(uint256 random_number, address caller_address, uint256 id) external;
        function setG13RandomNumber(uint256 random_number, address caller_address, uint256 id) external;
        function setG35RandomNumber(uint256 random_number, address caller_address, uint256 id) external;
        function setHDLRandomNumber(uint256 random_number, address caller_address, uint256 id) external;

        function setH13BatchRandomNumber(uint256[] random_numbers, address caller_address, uint256 id) external;
        function setH35BatchRandomNumber(uint256[] random_numbers, address caller_address, uint256 id) external;
        function setG13BatchRandomNumber(uint256[] random_numbers, address caller_address, uint256 id) external;
        function setG35BatchRandomNumber(uint256[] random_numbers, address caller_address, uint256 id) external;
    }
}

#[cfg(test)]
mod test {
    use alloy_sol_types::{SolCall, SolEvent};

    use super::IRngOracle;
    use crate::subsystems::queue::Category;

    #[test]
    fn names_match_categories() {
        assert_eq!(
            IRngOracle::RequestedHDLRandomNumber::SIGNATURE,
            format!("{}(uint256,address)", Category::DL.event_name())
        );
        assert_eq!(
            IRngOracle::RequestedG35BatchRandomNumber::SIGNATURE,
            format!("{}(uint256,address)", Category::G35Batch.event_name())
        );
        assert_eq!(
            IRngOracle::setHDLRandomNumberCall::SIGNATURE,
            format!("{}(uint256,address,uint256)", Category::DL.submit_method())
        );
        assert_eq!(
            IRngOracle::setH13BatchRandomNumberCall::SIGNATURE,
            format!("{}(uint256[],address,uint256)", Category::H13Batch.submit_method())
        );
    }
}
